//! Chess engine integration
//!
//! Provides a lazily started UCI engine (e.g. Stockfish) shared by all
//! analysis requests.

pub mod analysis;
pub mod manager;
pub mod uci;

pub use analysis::{AnalysisResult, Evaluation, MATE_SCORE_CP};
pub use manager::{EngineLease, EngineManager};
pub use uci::UciEngine;
