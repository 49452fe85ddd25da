//! Service configuration read from environment variables

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Starting position, standard start when unset
    pub start_fen: Option<String>,
    pub engine: EngineConfig,
    pub generator: GeneratorConfig,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    /// Executable path, or a name looked up on `PATH`
    pub path: String,
    pub args: Vec<String>,
    /// Search time per analysis
    pub movetime: Duration,
    /// Limit for process start plus UCI handshake
    pub startup_timeout: Duration,
    /// Longest wait for another analysis to finish
    pub queue_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            path: "stockfish".to_string(),
            args: Vec::new(),
            movetime: Duration::from_millis(1000),
            startup_timeout: Duration::from_millis(5000),
            queue_timeout: Duration::from_millis(10_000),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GeneratorConfig {
    /// Base URL of an OpenAI-compatible API, without `/chat/completions`
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            timeout: Duration::from_secs(30),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset keys take their default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let engine_defaults = EngineConfig::default();
        let generator_defaults = GeneratorConfig::default();

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or(&get, "PORT", 5001)?,
            start_fen: get("CHESS_START_FEN"),
            engine: EngineConfig {
                path: get("STOCKFISH_PATH").unwrap_or(engine_defaults.path),
                args: get("ENGINE_ARGS")
                    .map(|v| v.split_whitespace().map(str::to_string).collect())
                    .unwrap_or_default(),
                movetime: millis_or(&get, "ENGINE_MOVETIME_MS", engine_defaults.movetime)?,
                startup_timeout: millis_or(
                    &get,
                    "ENGINE_STARTUP_TIMEOUT_MS",
                    engine_defaults.startup_timeout,
                )?,
                queue_timeout: millis_or(
                    &get,
                    "ENGINE_QUEUE_TIMEOUT_MS",
                    engine_defaults.queue_timeout,
                )?,
            },
            generator: GeneratorConfig {
                base_url: get("LLM_BASE_URL")
                    .map(|url| url.trim_end_matches('/').to_string())
                    .unwrap_or(generator_defaults.base_url),
                model: get("LLM_MODEL").unwrap_or(generator_defaults.model),
                api_key: get("LLM_API_KEY"),
                timeout: Duration::from_secs(parse_or(
                    &get,
                    "LLM_TIMEOUT_SECS",
                    generator_defaults.timeout.as_secs(),
                )?),
            },
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(value) => value.trim().parse().map_err(|_| ConfigError {
            key: key.to_string(),
            value,
        }),
        None => Ok(default),
    }
}

fn millis_or<G>(get: &G, key: &str, default: Duration) -> Result<Duration, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    parse_or(get, key, default.as_millis() as u64).map(Duration::from_millis)
}
