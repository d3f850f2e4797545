//! Storage trait definitions for Skillforge
//!
//! These traits define the persistence abstraction the pipeline writes
//! through:
//! - `ProfileStore`: field-scoped reads and patches of skill profiles
//!
//! All traits are async and backend-agnostic. An in-memory fake is provided
//! for testing via the `fakes` module.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Unique identifier for a skill profile.
///
/// Opaque to this crate; callers usually pass through an account or
/// student id minted elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProfileId(pub String);

impl ProfileId {
    /// Generate a new random profile id.
    pub fn new() -> Self {
        ProfileId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ProfileId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for ProfileId {
    fn from(s: &str) -> Self {
        ProfileId(s.to_string())
    }
}

impl std::fmt::Display for ProfileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Evidence sources
// ---------------------------------------------------------------------------

/// The evidence source a score was derived from.
///
/// Sources are ranked: when two sources can both produce the same skill
/// column, the higher-priority source wins and a lower-priority write must
/// not replace it. `Submissions` is ranked above `Repositories` because
/// solved-problem counts measure algorithmic skill directly, while
/// repository contents only imply it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceId {
    /// Public code repositories (project evidence).
    Repositories,
    /// Accepted problem submissions (algorithmic evidence).
    Submissions,
}

impl SourceId {
    pub const ALL: [SourceId; 2] = [SourceId::Repositories, SourceId::Submissions];

    /// Rank of this source. Higher wins when writing a shared column.
    pub fn priority(self) -> u8 {
        match self {
            SourceId::Repositories => 1,
            SourceId::Submissions => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SourceId::Repositories => "repositories",
            SourceId::Submissions => "submissions",
        }
    }

    /// Every source whose writes this source is allowed to replace,
    /// including itself (equal-priority rewrites keep reruns idempotent).
    pub fn overridable(self) -> Vec<SourceId> {
        SourceId::ALL
            .into_iter()
            .filter(|other| other.priority() <= self.priority())
            .collect()
    }
}

impl std::str::FromStr for SourceId {
    type Err = StoreError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "repositories" => Ok(SourceId::Repositories),
            "submissions" => Ok(SourceId::Submissions),
            other => Err(StoreError::Serialization(format!(
                "unknown evidence source: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A score paired with the source that produced it.
///
/// Used for columns more than one source can write; the store compares the
/// incoming source against the tag persisted next to the column and drops
/// the write when the persisted tag outranks it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaggedScore {
    pub value: f64,
    pub source: SourceId,
}

impl TaggedScore {
    pub fn new(value: f64, source: SourceId) -> Self {
        TaggedScore { value, source }
    }
}

// ---------------------------------------------------------------------------
// Profiles and patches
// ---------------------------------------------------------------------------

/// Full skill profile as read back from a store.
///
/// Score columns are `None` until the first analysis run writes them.
/// `verified` and `manual_override` are owned by review tooling outside
/// this pipeline; the pipeline reads them at most and never writes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillProfile {
    pub profile_id: ProfileId,
    pub frontend_skill: Option<f64>,
    pub backend_skill: Option<f64>,
    pub dsa_skill: Option<f64>,
    /// Which source last wrote `dsa_skill`. Persisted so precedence
    /// survives process restarts and interleaved runs.
    pub dsa_skill_source: Option<SourceId>,
    pub github_handle: Option<String>,
    pub leetcode_handle: Option<String>,
    pub github_stats: Option<serde_json::Value>,
    pub topic_stats: Option<serde_json::Value>,
    pub last_analyzed_at: Option<DateTime<Utc>>,
    pub verified: bool,
    pub manual_override: bool,
    pub created_at: DateTime<Utc>,
}

impl SkillProfile {
    /// A fresh profile with no evidence recorded yet.
    pub fn new(profile_id: ProfileId) -> Self {
        SkillProfile {
            profile_id,
            frontend_skill: None,
            backend_skill: None,
            dsa_skill: None,
            dsa_skill_source: None,
            github_handle: None,
            leetcode_handle: None,
            github_stats: None,
            topic_stats: None,
            last_analyzed_at: None,
            verified: false,
            manual_override: false,
            created_at: Utc::now(),
        }
    }
}

/// A field-scoped update to a skill profile.
///
/// Every field is optional; `None` means "leave the stored value alone",
/// never "blank the stored value". The shared `dsa_skill` column travels as
/// a [`TaggedScore`] so the store can apply source precedence atomically
/// with the rest of the patch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfilePatch {
    pub frontend_skill: Option<f64>,
    pub backend_skill: Option<f64>,
    pub dsa_skill: Option<TaggedScore>,
    pub github_handle: Option<String>,
    pub leetcode_handle: Option<String>,
    pub github_stats: Option<serde_json::Value>,
    pub topic_stats: Option<serde_json::Value>,
    pub last_analyzed_at: Option<DateTime<Utc>>,
}

impl ProfilePatch {
    /// True when the patch would not touch any column.
    pub fn is_empty(&self) -> bool {
        self == &ProfilePatch::default()
    }
}

// ---------------------------------------------------------------------------
// ProfileStore
// ---------------------------------------------------------------------------

/// Skill profile persistence.
///
/// Guarantees:
/// - `update_fields` writes exactly the columns present in the patch and
///   leaves every other column untouched. It is never a row replace.
/// - A `dsa_skill` write only lands when the incoming source's priority is
///   greater than or equal to the priority persisted in `dsa_skill_source`
///   (an untagged column accepts any source). Skipped writes are not errors.
/// - Patch application is atomic per call: concurrent patches interleave at
///   whole-patch granularity, never per-column.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetch a profile. Returns `StoreError::ProfileNotFound` if absent.
    async fn get_profile(&self, profile_id: &ProfileId) -> StoreResult<SkillProfile>;

    /// Apply a field-scoped patch to an existing profile.
    /// Returns `StoreError::ProfileNotFound` if absent.
    async fn update_fields(&self, profile_id: &ProfileId, patch: ProfilePatch)
        -> StoreResult<()>;
}
