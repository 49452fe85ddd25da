//! Types for representing engine analysis results

use std::fmt;

use shakmaty::Color;

/// Centipawn value used in place of a forced mate
pub const MATE_SCORE_CP: i32 = 10_000;

/// Represents a position evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluation {
    /// Centipawn score
    Centipawns(i32),
    /// Forced mate in N moves (positive = the scored side mates)
    Mate(i32),
}

impl Evaluation {
    /// Converts a score reported from the side to move's point of view into
    /// one from White's point of view.
    pub fn from_side_to_move(self, turn: Color) -> Self {
        match turn {
            Color::White => self,
            Color::Black => self.negate(),
        }
    }

    pub fn negate(self) -> Self {
        match self {
            Evaluation::Centipawns(cp) => Evaluation::Centipawns(cp.saturating_neg()),
            Evaluation::Mate(moves) => Evaluation::Mate(moves.saturating_neg()),
        }
    }

    /// Centipawns, with mates saturated to [`MATE_SCORE_CP`]
    pub fn as_centipawns(&self) -> i32 {
        match self {
            Evaluation::Centipawns(cp) => *cp,
            Evaluation::Mate(moves) if *moves > 0 => MATE_SCORE_CP,
            Evaluation::Mate(_) => -MATE_SCORE_CP,
        }
    }

    /// Score in pawn units
    pub fn as_pawns(&self) -> f64 {
        self.as_centipawns() as f64 / 100.0
    }

    pub fn mate_in(&self) -> Option<i32> {
        match self {
            Evaluation::Mate(moves) => Some(*moves),
            Evaluation::Centipawns(_) => None,
        }
    }
}

/// Pawn score with sign and two decimals, e.g. `+0.35`, `-100.00`
impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+.2}", self.as_pawns())
    }
}

/// Complete analysis of a position.
///
/// `evaluation` is always from White's point of view: positive favours
/// White, negative favours Black, whoever was to move.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    /// Best move found, in UCI notation
    pub best_move: String,
    /// Evaluation of the position
    pub evaluation: Evaluation,
    /// Analysis depth reached
    pub depth: u32,
    /// Principal variation (best line of play)
    pub pv: Vec<String>,
}

impl AnalysisResult {
    /// Returns a brief summary of the analysis
    pub fn summary(&self) -> String {
        format!(
            "Eval: {} | Best: {} | Depth: {} | PV: {}",
            self.evaluation,
            self.best_move,
            self.depth,
            self.pv.join(" ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_two_decimals() {
        assert_eq!(Evaluation::Centipawns(35).to_string(), "+0.35");
        assert_eq!(Evaluation::Centipawns(-120).to_string(), "-1.20");
        assert_eq!(Evaluation::Centipawns(0).to_string(), "+0.00");
    }

    #[test]
    fn test_mate_saturates() {
        assert_eq!(Evaluation::Mate(3).to_string(), "+100.00");
        assert_eq!(Evaluation::Mate(-2).as_centipawns(), -MATE_SCORE_CP);
        assert_eq!(Evaluation::Mate(-2).mate_in(), Some(-2));
    }

    #[test]
    fn test_black_to_move_is_flipped_to_white_view() {
        // Black to move and Black is better: White's view must be negative
        let eval = Evaluation::Centipawns(80).from_side_to_move(Color::Black);
        assert_eq!(eval, Evaluation::Centipawns(-80));

        let eval = Evaluation::Centipawns(80).from_side_to_move(Color::White);
        assert_eq!(eval, Evaluation::Centipawns(80));
    }

    #[test]
    fn test_negate_extreme_scores() {
        let eval = Evaluation::Centipawns(i32::MIN).from_side_to_move(Color::Black);
        assert_eq!(eval, Evaluation::Centipawns(i32::MAX));
        assert_eq!(Evaluation::Mate(i32::MIN).negate(), Evaluation::Mate(i32::MAX));
    }
}
