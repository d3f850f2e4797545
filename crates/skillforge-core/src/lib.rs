//! Skillforge Core - Skill Verification & Scoring Pipeline
//!
//! Converts evidence of technical ability from independent external sources
//! into normalized skill scores and merges them into a shared, persisted
//! skill profile. The pipeline per source is:
//!
//! ```text
//! fetch evidence -> normalize -> score (oracle) -> validate -> merge
//! ```
//!
//! ## Key Components
//!
//! - `Handle`: validated external-platform identifier (fail fast, no I/O)
//! - `evidence`: fetcher traits plus GitHub/LeetCode implementations
//! - `normalize`: pure reduction of raw records into bounded summaries
//! - `oracle`: scoring-oracle trait, Gemini client, prompt builders
//! - `validate`: untrusted oracle text -> checked `ScorePayload`
//! - `merge`: field-scoped profile patches with source precedence
//! - `pipeline`: the orchestrator driving one run end to end
//!
//! Two runs (one per evidence source) may execute concurrently against the
//! same profile; the field-scoped merge contract in `profile-state` is the
//! only coordination between them.

pub mod evidence;
mod handle;
pub mod merge;
pub mod normalize;
pub mod obs;
pub mod oracle;
pub mod pipeline;
pub mod telemetry;
pub mod validate;

pub use evidence::{
    EvidenceError, RepoRecord, RepositoryEvidence, SubmissionActivity, SubmissionEvidence,
    TopicRecord,
};
pub use handle::{Handle, HandleError};
pub use normalize::{RepoSummary, SubmissionSummary};
pub use oracle::{OracleError, ScoringOracle};
pub use pipeline::{AnalysisPipeline, FailureKind, RetryPolicy, RunReport, RunStage};
pub use validate::{OutputSchema, ScorePayload, ValidationError};
