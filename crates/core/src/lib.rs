//! Chess Coach Core Library
//!
//! One authoritative game, a lazily started UCI engine and a coaching
//! pipeline that turns engine analysis plus a question into advice.

pub mod coach;
pub mod config;
pub mod engine;
pub mod error;
pub mod game;
pub mod session;

pub use coach::{ChatClient, Coach, TextGenerator};
pub use config::{Config, EngineConfig, GeneratorConfig};
pub use engine::{AnalysisResult, EngineManager, Evaluation};
pub use error::{EngineError, Error, GenerationError, MoveError, Result};
pub use game::{Game, GameStatus};
pub use session::{AdviceResponse, MoveResponse, Session, StateResponse};
