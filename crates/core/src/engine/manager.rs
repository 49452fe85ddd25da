//! Lazily started, shared engine process
//!
//! At most one engine process exists. It is started on the first
//! [`EngineManager::acquire`], reused afterwards and stopped by
//! [`EngineManager::release`]. A lease holds the engine mutex, so analyses
//! never interleave on the process's stdin/stdout.

use std::time::Duration;

use shakmaty::{fen::Fen, CastlingMode, Chess, Color, Position};
use tokio::sync::{Mutex, MutexGuard};
use tokio::task;

use super::analysis::AnalysisResult;
use super::uci::UciEngine;
use crate::config::EngineConfig;
use crate::error::EngineError;

/// Extra time granted on top of the search budget before giving up on the engine
const SEARCH_GRACE: Duration = Duration::from_secs(2);

pub struct EngineManager {
    config: EngineConfig,
    slot: Mutex<Option<UciEngine>>,
}

/// Exclusive access to a running engine, obtained from [`EngineManager::acquire`]
pub struct EngineLease<'a> {
    slot: MutexGuard<'a, Option<UciEngine>>,
}

impl EngineManager {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            slot: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Waits for the engine and starts it if needed.
    ///
    /// Waiters queue in arrival order; waiting longer than the queue timeout
    /// fails with [`EngineError::Busy`]. Start failures are not cached, the
    /// next call tries again.
    pub async fn acquire(&self) -> Result<EngineLease<'_>, EngineError> {
        let mut slot = tokio::time::timeout(self.config.queue_timeout, self.slot.lock())
            .await
            .map_err(|_| EngineError::Busy)?;

        if let Some(engine) = slot.as_mut() {
            if !engine.is_alive() {
                tracing::warn!("engine process has exited, restarting");
                *slot = None;
            }
        }

        if slot.is_none() {
            *slot = Some(self.start().await?);
        }

        Ok(EngineLease { slot })
    }

    async fn start(&self) -> Result<UciEngine, EngineError> {
        let path = self.config.path.clone();
        let args = self.config.args.clone();
        let startup_timeout = self.config.startup_timeout;

        let spawned = task::spawn_blocking(move || UciEngine::spawn(&path, &args));
        match tokio::time::timeout(startup_timeout, spawned).await {
            Ok(Ok(result)) => result.map_err(|e| {
                tracing::warn!(path = %self.config.path, error = %e, "engine unavailable");
                e
            }),
            Ok(Err(join)) => Err(EngineError::Spawn(join.to_string())),
            Err(_) => Err(EngineError::Spawn(format!(
                "no UCI handshake within {} ms",
                startup_timeout.as_millis()
            ))),
        }
    }

    /// Acquires the engine and analyses `fen` with the configured budget
    pub async fn analyze(&self, fen: &str) -> Result<AnalysisResult, EngineError> {
        let mut lease = self.acquire().await?;
        lease.analyze(fen, self.config.movetime).await
    }

    /// True if an engine process is currently held
    pub async fn is_running(&self) -> bool {
        self.slot.lock().await.is_some()
    }

    /// Stops the engine if one is running. Safe to call repeatedly.
    pub async fn release(&self) {
        let engine = self.slot.lock().await.take();
        if let Some(engine) = engine {
            // Drop sends `quit` and waits briefly for the process
            if let Err(e) = task::spawn_blocking(move || drop(engine)).await {
                tracing::error!(error = %e, "failed to stop engine");
            }
        }
    }
}

impl EngineLease<'_> {
    /// Analyses `fen` for `budget`.
    ///
    /// A failed analysis keeps the process unless it died. If the engine does
    /// not answer within `budget` plus a grace period the process is abandoned
    /// and the next acquire starts a new one.
    pub async fn analyze(&mut self, fen: &str, budget: Duration) -> Result<AnalysisResult, EngineError> {
        let turn = side_to_move(fen)?;
        let mut engine = self.slot.take().ok_or(EngineError::NotRunning)?;

        let owned_fen = fen.to_string();
        let search = task::spawn_blocking(move || {
            let output = engine.search(&owned_fen, budget);
            (engine, output)
        });

        let deadline = budget + SEARCH_GRACE;
        let (mut engine, output) = match tokio::time::timeout(deadline, search).await {
            Ok(Ok(done)) => done,
            Ok(Err(join)) => {
                return Err(EngineError::Protocol(format!("analysis task failed: {}", join)));
            }
            Err(_) => {
                tracing::warn!(fen, "engine timed out, abandoning process");
                return Err(EngineError::Timeout(deadline.as_millis() as u64));
            }
        };

        if engine.is_alive() {
            *self.slot = Some(engine);
        } else {
            tracing::warn!("engine exited during analysis");
        }

        let output = output?;
        let result = AnalysisResult {
            best_move: output.best_move,
            evaluation: output.evaluation.from_side_to_move(turn),
            depth: output.depth,
            pv: output.pv,
        };
        tracing::debug!(summary = %result.summary(), "analysis complete");
        Ok(result)
    }
}

fn side_to_move(fen: &str) -> Result<Color, EngineError> {
    let parsed: Fen = fen
        .parse()
        .map_err(|e| EngineError::InvalidPosition(format!("{}", e)))?;
    let position: Chess = parsed
        .into_position(CastlingMode::Standard)
        .map_err(|e| EngineError::InvalidPosition(format!("{}", e)))?;
    Ok(position.turn())
}
