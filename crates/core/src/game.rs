//! The authoritative in-memory game.
//!
//! Wraps a shakmaty [`Chess`] position and keeps the repetition history that
//! shakmaty itself does not track, so the fivefold rule can be detected.

use std::collections::HashMap;

use shakmaty::{fen::Fen, uci::UciMove, CastlingMode, Chess, Color, EnPassantMode, Position};

use crate::error::{Error, MoveError, Result};

/// Halfmove clock value at which the seventy-five-move rule ends the game
const SEVENTY_FIVE_MOVE_PLIES: u32 = 150;

/// Occurrences of one position that end the game by repetition
const FIVEFOLD: u32 = 5;

/// Classification of a position after a move, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Checkmate { winner: Color },
    Stalemate,
    InsufficientMaterial,
    SeventyFiveMoveRule,
    FivefoldRepetition,
    Check,
}

impl GameStatus {
    /// Returns true for every status that ends the game
    pub fn is_game_over(&self) -> bool {
        !matches!(self, GameStatus::Check)
    }

    /// Human-readable status line shown to the player
    pub fn message(&self) -> String {
        match self {
            GameStatus::Checkmate { winner } => format!("Checkmate! {} wins.", color_name(*winner)),
            GameStatus::Stalemate => "Stalemate! It's a draw.".to_string(),
            GameStatus::InsufficientMaterial => "Draw due to insufficient material.".to_string(),
            GameStatus::SeventyFiveMoveRule => "Draw due to 75-move rule.".to_string(),
            GameStatus::FivefoldRepetition => "Draw due to fivefold repetition.".to_string(),
            GameStatus::Check => "Check!".to_string(),
        }
    }

    /// Stable machine-readable code used in API responses
    pub fn code(&self) -> &'static str {
        match self {
            GameStatus::Checkmate { .. } => "checkmate",
            GameStatus::Stalemate => "stalemate",
            GameStatus::InsufficientMaterial => "insufficient_material",
            GameStatus::SeventyFiveMoveRule => "seventy_five_move_rule",
            GameStatus::FivefoldRepetition => "fivefold_repetition",
            GameStatus::Check => "check",
        }
    }
}

pub fn color_name(color: Color) -> &'static str {
    match color {
        Color::White => "White",
        Color::Black => "Black",
    }
}

/// One chess game, mutated only through [`Game::apply_move`].
#[derive(Debug, Clone)]
pub struct Game {
    position: Chess,
    repetitions: HashMap<String, u32>,
}

impl Game {
    /// Creates a game from the standard starting position
    pub fn new() -> Self {
        Self::from_position(Chess::default())
    }

    /// Creates a game from a FEN string
    pub fn from_fen(fen: &str) -> Result<Self> {
        let parsed: Fen = fen.trim().parse().map_err(|e| Error::Fen(format!("{}", e)))?;
        let position: Chess = parsed
            .into_position(CastlingMode::Standard)
            .map_err(|e| Error::Fen(format!("{}", e)))?;
        Ok(Self::from_position(position))
    }

    fn from_position(position: Chess) -> Self {
        let mut game = Self {
            position,
            repetitions: HashMap::new(),
        };
        game.record_repetition();
        game
    }

    pub fn position(&self) -> &Chess {
        &self.position
    }

    pub fn turn(&self) -> Color {
        self.position.turn()
    }

    /// Canonical FEN of the current position
    pub fn fen(&self) -> String {
        Fen::from_position(&self.position, EnPassantMode::Legal).to_string()
    }

    /// Validates and plays a move given in UCI notation.
    ///
    /// On error the game is left untouched. On success the returned value is
    /// the classification of the new position, or `None` for a quiet move.
    pub fn apply_move(&mut self, notation: &str) -> std::result::Result<Option<GameStatus>, MoveError> {
        if let Some(status) = self.status().filter(GameStatus::is_game_over) {
            return Err(MoveError::GameOver(status.message()));
        }

        let uci: UciMove = notation
            .trim()
            .parse()
            .map_err(|_| MoveError::Malformed(notation.to_string()))?;

        let mv = uci
            .to_move(&self.position)
            .map_err(|_| MoveError::Illegal(notation.to_string()))?;

        self.position = self
            .position
            .clone()
            .play(mv)
            .map_err(|_| MoveError::Illegal(notation.to_string()))?;
        self.record_repetition();

        let status = self.status();
        tracing::debug!(mv = notation, fen = %self.fen(), ?status, "move applied");
        Ok(status)
    }

    /// Classifies the current position; first match wins.
    pub fn status(&self) -> Option<GameStatus> {
        let pos = &self.position;
        if pos.is_checkmate() {
            Some(GameStatus::Checkmate { winner: !pos.turn() })
        } else if pos.is_stalemate() {
            Some(GameStatus::Stalemate)
        } else if pos.is_insufficient_material() {
            Some(GameStatus::InsufficientMaterial)
        } else if pos.halfmoves() >= SEVENTY_FIVE_MOVE_PLIES {
            Some(GameStatus::SeventyFiveMoveRule)
        } else if self.repetition_count() >= FIVEFOLD {
            Some(GameStatus::FivefoldRepetition)
        } else if pos.is_check() {
            Some(GameStatus::Check)
        } else {
            None
        }
    }

    /// How often the current position has occurred in this game
    pub fn repetition_count(&self) -> u32 {
        self.repetitions
            .get(&self.repetition_key())
            .copied()
            .unwrap_or(0)
    }

    fn record_repetition(&mut self) {
        *self.repetitions.entry(self.repetition_key()).or_insert(0) += 1;
    }

    // Board, side to move, castling rights and en passant; counters excluded.
    fn repetition_key(&self) -> String {
        self.fen()
            .split_whitespace()
            .take(4)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}
