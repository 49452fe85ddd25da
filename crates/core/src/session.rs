//! Request handling for the single shared game
//!
//! Turns move and question requests into response payloads. Nothing here
//! returns an error: every failure becomes a structured rejection.

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use crate::coach::Coach;
use crate::error::MoveError;
use crate::game::{color_name, Game};

const INTERNAL_MOVE_ERROR: &str = "An internal error occurred.";
const INTERNAL_ADVICE_ERROR: &str = "Failed to get advice from the coach.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoveResponse {
    pub success: bool,
    /// Position after the move, or the unchanged position on rejection
    pub fen: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MoveResponse {
    fn rejected(fen: String, error: impl Into<String>) -> Self {
        Self {
            success: false,
            fen,
            message: None,
            status: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdviceResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AdviceResponse {
    fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            advice: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateResponse {
    pub fen: String,
    pub turn: &'static str,
    pub game_over: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

pub struct Session {
    game: Mutex<Game>,
    coach: Coach,
}

impl Session {
    pub fn new(game: Game, coach: Coach) -> Self {
        Self {
            game: Mutex::new(game),
            coach,
        }
    }

    fn game(&self) -> Option<MutexGuard<'_, Game>> {
        match self.game.lock() {
            Ok(game) => Some(game),
            Err(e) => {
                tracing::error!(error = %e, "game state lock poisoned");
                None
            }
        }
    }

    /// Current FEN, or `None` if the game state is unusable
    pub fn fen(&self) -> Option<String> {
        self.game().map(|game| game.fen())
    }

    /// Last known FEN, read through a poisoned lock. Only used to echo the
    /// position in rejections.
    fn last_fen(&self) -> String {
        self.game
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .fen()
    }

    /// Rejection for a move request whose body could not be read
    pub fn reject_move_request(&self) -> MoveResponse {
        MoveResponse::rejected(self.last_fen(), INTERNAL_MOVE_ERROR)
    }

    /// Rejection for an advice request whose body could not be read
    pub fn reject_advice_request(&self) -> AdviceResponse {
        AdviceResponse::rejected(INTERNAL_ADVICE_ERROR)
    }

    /// Handles a move request
    pub fn submit_move(&self, notation: Option<&str>) -> MoveResponse {
        let Some(mut game) = self.game() else {
            return MoveResponse::rejected(self.last_fen(), INTERNAL_MOVE_ERROR);
        };
        let fen_before = game.fen();

        let notation = match notation.map(str::trim) {
            Some(n) if !n.is_empty() => n,
            _ => return MoveResponse::rejected(fen_before, "No move provided."),
        };

        match game.apply_move(notation) {
            Ok(status) => {
                tracing::info!(mv = notation, status = ?status.map(|s| s.code()), "move accepted");
                MoveResponse {
                    success: true,
                    fen: game.fen(),
                    message: status.map(|s| s.message()),
                    status: status.map(|s| s.code()),
                    error: None,
                }
            }
            Err(e) => {
                tracing::info!(mv = notation, error = %e, "move rejected");
                let error = match e {
                    MoveError::Malformed(n) => {
                        format!("Invalid move format: {}. Use UCI notation.", n)
                    }
                    MoveError::Illegal(n) => format!("Invalid move: {}", n),
                    MoveError::GameOver(status) => format!("Game is over: {}", status),
                };
                MoveResponse::rejected(fen_before, error)
            }
        }
    }

    /// Handles a coaching question about the current position
    pub async fn ask(&self, query: Option<&str>) -> AdviceResponse {
        let query = match query.map(str::trim) {
            Some(q) if !q.is_empty() => q.to_string(),
            _ => return AdviceResponse::rejected("No query provided."),
        };

        // Lock is released before any await
        let Some(fen) = self.fen() else {
            return AdviceResponse::rejected(INTERNAL_ADVICE_ERROR);
        };

        let coach = self.coach.clone();
        let advice = tokio::spawn(async move { coach.advise(&fen, &query).await });

        match advice.await {
            Ok(advice) => AdviceResponse {
                success: true,
                advice: Some(advice),
                error: None,
            },
            Err(e) => {
                tracing::error!(error = %e, "advice task failed");
                AdviceResponse::rejected(INTERNAL_ADVICE_ERROR)
            }
        }
    }

    /// Current position and its classification
    pub fn snapshot(&self) -> Option<StateResponse> {
        let game = self.game()?;
        let status = game.status();
        Some(StateResponse {
            fen: game.fen(),
            turn: color_name(game.turn()),
            game_over: status.map_or(false, |s| s.is_game_over()),
            status: status.map(|s| s.code()),
            message: status.map(|s| s.message()),
        })
    }

    /// Releases the engine process; called once on shutdown
    pub async fn shutdown(&self) {
        tracing::info!("releasing engine");
        self.coach.engine().release().await;
    }
}
