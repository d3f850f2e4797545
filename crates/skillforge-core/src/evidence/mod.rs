//! Evidence fetchers: raw activity records from external platforms.
//!
//! Two independent sources feed the pipeline:
//! - repository evidence (project metadata, per-repo primary language)
//! - submission evidence (solved-problem counts by topic, ranking)
//!
//! Fetchers are stateless, make no writes, and return records
//! newest/most-relevant first, capped so downstream prompt size is bounded.

mod github;
mod leetcode;

pub use github::{GithubConfig, GithubRepoFetcher};
pub use leetcode::{LeetcodeConfig, LeetcodeSubmissionFetcher};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::handle::Handle;

/// Maximum records returned by any fetcher.
pub const MAX_RECORDS: usize = 100;

/// Errors surfaced by evidence fetchers.
#[derive(Error, Debug)]
pub enum EvidenceError {
    /// The handle does not exist on the platform. Terminal.
    #[error("handle {handle:?} not found on the evidence platform")]
    HandleNotFound { handle: String },

    /// The handle exists but has zero usable records. Terminal; the run
    /// must stop before any oracle call.
    #[error("handle has no usable activity records")]
    EmptyEvidence,

    /// Timeout, 5xx, rate limit. Retryable with a bounded budget.
    #[error("evidence source unavailable: {reason}")]
    Transient { reason: String },

    /// The platform answered but the body could not be decoded. Terminal.
    #[error("evidence response malformed: {detail}")]
    Malformed { detail: String },
}

impl EvidenceError {
    /// Whether the orchestrator may retry this failure.
    pub fn is_transient(&self) -> bool {
        matches!(self, EvidenceError::Transient { .. })
    }

    /// Classify a transport-level reqwest error.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            EvidenceError::Transient {
                reason: "request timed out".to_string(),
            }
        } else if err.is_connect() {
            EvidenceError::Transient {
                reason: format!("connection failed: {err}"),
            }
        } else if err.is_decode() {
            EvidenceError::Malformed {
                detail: err.to_string(),
            }
        } else {
            EvidenceError::Transient {
                reason: err.to_string(),
            }
        }
    }
}

/// One repository's metadata, as fetched. Immutable; discarded after
/// normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRecord {
    pub name: String,
    pub description: Option<String>,
    pub language: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
}

/// Solved-problem count for one topic tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicRecord {
    pub tag_name: String,
    pub tag_slug: String,
    pub problems_solved: u32,
}

/// Everything the submission source reports for one handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionActivity {
    pub topics: Vec<TopicRecord>,
    pub total_solved: u32,
    pub ranking: u64,
    /// Accepted-solution counts keyed by difficulty label
    /// (`Easy`/`Medium`/`Hard`).
    pub solved_by_difficulty: Vec<(String, u32)>,
}

/// Repository evidence source (project metadata).
#[async_trait]
pub trait RepositoryEvidence: Send + Sync {
    /// Fetch up to [`MAX_RECORDS`] repositories for `handle`, most recently
    /// updated first.
    async fn fetch(&self, handle: &Handle) -> Result<Vec<RepoRecord>, EvidenceError>;
}

/// Submission evidence source (solved-problem statistics).
#[async_trait]
pub trait SubmissionEvidence: Send + Sync {
    /// Fetch the solved-problem profile for `handle`.
    ///
    /// A handle that exists with zero accepted solutions is
    /// `EmptyEvidence`, distinct from `HandleNotFound`.
    async fn fetch(&self, handle: &Handle) -> Result<SubmissionActivity, EvidenceError>;
}
