//! Scoring oracle: generative text completion over evidence summaries.
//!
//! The oracle is opaque and best-effort. The client builds a prompt,
//! returns the completion text verbatim, and never parses or trusts it;
//! structure enforcement belongs entirely to the validator.

mod gemini;
pub mod prompt;

pub use gemini::{GeminiConfig, GeminiOracle};

use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by oracle clients.
#[derive(Error, Debug)]
pub enum OracleError {
    /// Network failure or service error. Retryable with a bounded budget.
    #[error("oracle unavailable: {reason}")]
    Unavailable { reason: String },

    /// The call exceeded its fixed timeout. Retryable.
    #[error("oracle call timed out")]
    Timeout,

    /// The service answered but produced no completion candidates.
    /// Retryable as a re-prompt.
    #[error("oracle returned an empty completion")]
    EmptyCompletion,
}

impl OracleError {
    /// Whether the orchestrator may retry this failure.
    pub fn is_transient(&self) -> bool {
        // Every oracle failure class is worth one more bounded attempt;
        // the variants exist so the report can say which one happened.
        true
    }
}

/// Text-completion service used to convert evidence into scores.
#[async_trait]
pub trait ScoringOracle: Send + Sync {
    /// Complete `prompt` and return the raw text verbatim.
    async fn complete(&self, prompt: &str) -> Result<String, OracleError>;
}
