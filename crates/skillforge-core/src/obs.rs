//! Structured observability hooks for pipeline run lifecycle events.
//!
//! Provides a run-scoped tracing span via the `RunSpan` RAII guard plus
//! emission functions for the key lifecycle events: start, stage failure,
//! finish. Events are emitted at `info!` level; set `RUST_LOG` to filter.

use tracing::{info, warn};
use uuid::Uuid;

/// RAII guard that enters a run-scoped tracing span for the duration of
/// one pipeline run.
pub struct RunSpan {
    _span: tracing::span::EnteredSpan,
}

impl RunSpan {
    /// Create and enter a span tagged with the run id and evidence source.
    pub fn enter(run_id: Uuid, source: &str) -> Self {
        let span = tracing::info_span!("skillforge.run", run_id = %run_id, source = %source);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: analysis run started.
pub fn emit_run_started(run_id: Uuid, profile_id: &str, source: &str) {
    info!(
        event = "analysis.started",
        run_id = %run_id,
        profile_id = %profile_id,
        source = %source,
    );
}

/// Emit event: one pipeline stage failed (may still be retried).
pub fn emit_stage_failed(run_id: Uuid, stage: &str, attempt: u32, error: &dyn std::fmt::Display) {
    warn!(
        event = "analysis.stage_failed",
        run_id = %run_id,
        stage = %stage,
        attempt = attempt,
        error = %error,
    );
}

/// Emit event: analysis run finished.
pub fn emit_run_finished(run_id: Uuid, success: bool, stage_reached: &str, detail: &str) {
    info!(
        event = "analysis.finished",
        run_id = %run_id,
        success = success,
        stage_reached = %stage_reached,
        detail = %detail,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_span_enter_does_not_panic() {
        let _span = RunSpan::enter(Uuid::new_v4(), "repositories");
        emit_run_started(Uuid::new_v4(), "p-1", "repositories");
    }
}
