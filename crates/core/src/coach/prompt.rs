//! Prompt construction for the coaching backend

use std::fmt::Write;

use crate::engine::AnalysisResult;

/// System message sent with every coaching request
pub const SYSTEM_PROMPT: &str = "You are a friendly, knowledgeable chess coach. \
Explain ideas in plain language for a club-level player and keep answers short.";

/// Builds the user prompt from the position, the engine analysis (if any) and
/// the player's question.
pub fn build_prompt(fen: &str, analysis: Option<&AnalysisResult>, query: &str) -> String {
    let mut prompt = String::new();

    // Writing into a String cannot fail
    let _ = writeln!(prompt, "Current position (FEN): {}", fen.trim());
    if let Some(side) = side_to_move(fen) {
        let _ = writeln!(prompt, "Side to move: {}", side);
    }
    prompt.push('\n');

    match analysis {
        Some(analysis) => {
            let _ = writeln!(prompt, "Engine analysis:");
            let _ = writeln!(prompt, "- Best move: {}", analysis.best_move);
            let _ = writeln!(
                prompt,
                "- Evaluation: {} pawns (positive favours White, negative favours Black, \
                 regardless of whose turn it is)",
                analysis.evaluation
            );
            if let Some(moves) = analysis.evaluation.mate_in() {
                let winner = if moves > 0 { "White" } else { "Black" };
                let _ = writeln!(prompt, "- Forced mate: {} mates in {}", winner, moves.abs());
            }
            let _ = writeln!(prompt, "- Search depth: {}", analysis.depth);
            let _ = writeln!(prompt, "- Principal variation: {}", analysis.pv.join(" "));
        }
        None => {
            let _ = writeln!(
                prompt,
                "Engine analysis: not available. Rely on general chess principles \
                 (development, king safety, piece activity, pawn structure) instead."
            );
        }
    }

    let _ = writeln!(prompt, "\nPlayer's question: {}", query.trim());
    let _ = write!(
        prompt,
        "\nAnswer the question using the position and analysis above. \
         Use UCI or algebraic notation when naming moves."
    );
    prompt
}

fn side_to_move(fen: &str) -> Option<&'static str> {
    match fen.split_whitespace().nth(1) {
        Some("w") => Some("White"),
        Some("b") => Some("Black"),
        _ => None,
    }
}
