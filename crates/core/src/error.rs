//! Error types for chess-coach-core

use thiserror::Error;

/// Why a submitted move was rejected. The game is never mutated on error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    #[error("malformed move notation: {0}")]
    Malformed(String),

    #[error("illegal move: {0}")]
    Illegal(String),

    #[error("game is already over: {0}")]
    GameOver(String),
}

/// Error type for engine operations
#[derive(Error, Debug)]
pub enum EngineError {
    /// The executable could not be located
    #[error("engine executable not found: {0}")]
    NotFound(String),

    /// Any other failure while starting the process or during the handshake
    #[error("failed to start engine: {0}")]
    Spawn(String),

    /// Another analysis held the engine for longer than the queue timeout
    #[error("engine is busy with another analysis")]
    Busy,

    #[error("engine I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("engine protocol error: {0}")]
    Protocol(String),

    #[error("invalid position: {0}")]
    InvalidPosition(String),

    #[error("engine did not answer within {0} ms")]
    Timeout(u64),

    /// The lease lost its process (timeout or crash during this lease)
    #[error("engine is not running")]
    NotRunning,
}

impl EngineError {
    /// True for the two start-up failures, where no process exists at all.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, EngineError::NotFound(_) | EngineError::Spawn(_))
    }
}

/// Failures of the text-generation backend
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("generation backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not decode generation response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("generation backend returned no text")]
    Empty,

    #[error("generation timed out after {0} ms")]
    Timeout(u64),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid value for {key}: {value:?}")]
pub struct ConfigError {
    pub key: String,
    pub value: String,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid FEN: {0}")]
    Fen(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
