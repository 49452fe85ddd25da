//! Coaching pipeline: engine analysis, prompt, text generation
//!
//! [`Coach::advise`] always produces text. Each failing step has a named
//! fallback: no analysis degrades the prompt, no generation degrades to
//! [`fallback_advice`].

pub mod generator;
pub mod prompt;

use std::sync::Arc;
use std::time::Duration;

use crate::engine::{AnalysisResult, EngineManager};
use crate::error::GenerationError;

pub use generator::{ChatClient, TextGenerator};
pub use prompt::build_prompt;

#[derive(Clone)]
pub struct Coach {
    engine: Arc<EngineManager>,
    generator: Arc<dyn TextGenerator>,
    generation_timeout: Duration,
}

impl Coach {
    pub fn new(
        engine: Arc<EngineManager>,
        generator: Arc<dyn TextGenerator>,
        generation_timeout: Duration,
    ) -> Self {
        Self {
            engine,
            generator,
            generation_timeout,
        }
    }

    pub fn engine(&self) -> &Arc<EngineManager> {
        &self.engine
    }

    /// Best-effort engine analysis; `None` when the engine is down or fails
    pub async fn analysis(&self, fen: &str) -> Option<AnalysisResult> {
        match self.engine.analyze(fen).await {
            Ok(analysis) => Some(analysis),
            Err(e) if e.is_unavailable() => {
                tracing::warn!(error = %e, "engine unavailable, advising without analysis");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, fen, "analysis failed, advising without analysis");
                None
            }
        }
    }

    /// Sends a prompt to the generator, bounded by the generation timeout
    pub async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        match tokio::time::timeout(self.generation_timeout, self.generator.generate(prompt)).await {
            Ok(result) => result,
            Err(_) => Err(GenerationError::Timeout(
                self.generation_timeout.as_millis() as u64,
            )),
        }
    }

    /// Answers `query` about the position `fen`. Never fails.
    pub async fn advise(&self, fen: &str, query: &str) -> String {
        let analysis = self.analysis(fen).await;
        let prompt = build_prompt(fen, analysis.as_ref(), query);

        match self.generate(&prompt).await {
            Ok(advice) => advice,
            Err(e) => {
                tracing::warn!(error = %e, "generation failed, using fallback advice");
                fallback_advice(analysis.as_ref())
            }
        }
    }
}

/// Advice used when the generator cannot be reached. Reports whatever the
/// engine found so the player still gets something useful.
pub fn fallback_advice(analysis: Option<&AnalysisResult>) -> String {
    match analysis {
        Some(analysis) => format!(
            "The coach is unavailable right now. The engine suggests {} \
             (evaluation {}, positive favours White).",
            analysis.best_move, analysis.evaluation
        ),
        None => "The coach is unavailable right now, and engine analysis is not available \
                 either. Please try again in a moment."
            .to_string(),
    }
}
