//! UCI engine process
//!
//! Spawns the engine as a subprocess and talks to it over stdin/stdout.
//! Every call here blocks; async callers go through [`super::EngineManager`].

use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::Duration;

use super::analysis::Evaluation;
use crate::error::EngineError;

/// Raw search output, score still relative to the side to move
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutput {
    pub best_move: String,
    pub evaluation: Evaluation,
    pub depth: u32,
    pub pv: Vec<String>,
}

/// A running UCI engine
pub struct UciEngine {
    /// The child process
    process: Child,
    /// Stdin for sending commands
    stdin: ChildStdin,
    /// Stdout reader for receiving responses
    stdout: BufReader<ChildStdout>,
    /// Name reported in `id name`
    name: Option<String>,
}

impl UciEngine {
    /// Starts the engine and completes the UCI handshake.
    ///
    /// `path` may be a bare name resolved through `PATH`, e.g. `"stockfish"`.
    pub fn spawn(path: &str, args: &[String]) -> Result<Self, EngineError> {
        let mut process = Command::new(path)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => EngineError::NotFound(path.to_string()),
                _ => EngineError::Spawn(format!("{}: {}", path, e)),
            })?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| EngineError::Spawn("failed to open stdin".into()))?;

        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| EngineError::Spawn("failed to open stdout".into()))?;

        let mut engine = UciEngine {
            process,
            stdin,
            stdout: BufReader::new(stdout),
            name: None,
        };

        // Dropping the engine on failure kills the process
        if let Err(e) = engine.handshake() {
            return Err(EngineError::Spawn(format!("handshake failed: {}", e)));
        }

        tracing::info!(
            path,
            pid = engine.process.id(),
            name = engine.name.as_deref().unwrap_or("unknown"),
            "engine started"
        );
        Ok(engine)
    }

    /// False once the process has exited
    pub fn is_alive(&mut self) -> bool {
        matches!(self.process.try_wait(), Ok(None))
    }

    fn send(&mut self, cmd: &str) -> Result<(), EngineError> {
        tracing::debug!(">> {}", cmd);
        writeln!(self.stdin, "{}", cmd)?;
        self.stdin.flush()?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<String, EngineError> {
        let mut line = String::new();
        if self.stdout.read_line(&mut line)? == 0 {
            return Err(EngineError::Protocol("engine closed its output".into()));
        }
        let line = line.trim().to_string();
        tracing::trace!("<< {}", line);
        Ok(line)
    }

    fn read_until(&mut self, expected: &str) -> Result<Vec<String>, EngineError> {
        let mut lines = Vec::new();
        loop {
            let line = self.read_line()?;
            let done = line.starts_with(expected);
            lines.push(line);
            if done {
                break;
            }
        }
        Ok(lines)
    }

    fn handshake(&mut self) -> Result<(), EngineError> {
        self.send("uci")?;
        for line in self.read_until("uciok")? {
            if let Some(name) = line.strip_prefix("id name ") {
                self.name = Some(name.to_string());
            }
        }
        self.wait_ready()
    }

    fn wait_ready(&mut self) -> Result<(), EngineError> {
        self.send("isready")?;
        self.read_until("readyok")?;
        Ok(())
    }

    /// Searches `fen` for `movetime` and returns the last reported line.
    pub fn search(&mut self, fen: &str, movetime: Duration) -> Result<SearchOutput, EngineError> {
        self.send(&format!("position fen {}", fen))?;
        self.wait_ready()?;
        self.send(&format!("go movetime {}", movetime.as_millis()))?;

        let mut evaluation = None;
        let mut pv = Vec::new();
        let mut depth = 0u32;

        loop {
            let line = self.read_line()?;

            if line.starts_with("bestmove") {
                // "bestmove e2e4 ponder e7e5" or "bestmove (none)"
                let best_move = match line.split_whitespace().nth(1) {
                    Some("(none)") | None => {
                        return Err(EngineError::Protocol(format!("no best move: {}", line)));
                    }
                    Some(mv) => mv.to_string(),
                };
                if pv.first() != Some(&best_move) {
                    pv = vec![best_move.clone()];
                }
                return Ok(SearchOutput {
                    best_move,
                    evaluation: evaluation.ok_or_else(|| {
                        EngineError::Protocol("engine reported no score".into())
                    })?,
                    depth,
                    pv,
                });
            } else if line.starts_with("info") {
                parse_info_line(&line, &mut evaluation, &mut pv, &mut depth);
            }
        }
    }

    /// Quit the engine cleanly, killing it if it does not exit
    fn quit(&mut self) {
        if self.is_alive() {
            let _ = self.send("quit");
            // Give it a moment to exit
            std::thread::sleep(Duration::from_millis(100));
        }
        let _ = self.process.kill();
        let _ = self.process.wait();
        tracing::info!(pid = self.process.id(), "engine stopped");
    }
}

impl Drop for UciEngine {
    fn drop(&mut self) {
        self.quit();
    }
}

/// Parses an `info` line, keeping only lines with a real score
fn parse_info_line(
    line: &str,
    evaluation: &mut Option<Evaluation>,
    pv: &mut Vec<String>,
    depth: &mut u32,
) {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.get(1) == Some(&"string") {
        return;
    }

    let mut line_depth = None;
    let mut line_eval = None;
    let mut line_pv = None;
    let mut i = 1;

    while i < parts.len() {
        match parts[i] {
            "depth" => {
                line_depth = parts.get(i + 1).and_then(|d| d.parse().ok());
                i += 2;
            }
            "score" => {
                let value = parts.get(i + 2).and_then(|v| v.parse::<i32>().ok());
                line_eval = match (parts.get(i + 1).copied(), value) {
                    (Some("cp"), Some(cp)) => Some(Evaluation::Centipawns(cp)),
                    (Some("mate"), Some(m)) => Some(Evaluation::Mate(m)),
                    _ => None,
                };
                i += 3;
            }
            "pv" => {
                // Everything after "pv" is the principal variation
                line_pv = Some(parts[i + 1..].iter().map(|s| s.to_string()).collect());
                break;
            }
            _ => {
                i += 1;
            }
        }
    }

    if let Some(eval) = line_eval {
        *evaluation = Some(eval);
        if let Some(d) = line_depth {
            *depth = d;
        }
        if let Some(line_pv) = line_pv {
            *pv = line_pv;
        }
    }
}
