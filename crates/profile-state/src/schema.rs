//! Schema definitions for Skillforge SurrealDB tables
//!
//! Tables:
//! - profiles: One row per skill profile, patched field-by-field by
//!   analysis runs and read back whole.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::store_traits::{ProfileId, ProfilePatch, SkillProfile, StoreResult};

/// Module for serializing chrono DateTime to SurrealDB datetime format
mod surreal_datetime {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};
    use surrealdb::sql::Datetime as SurrealDatetime;

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let sd = SurrealDatetime::from(*date);
        serde::Serialize::serialize(&sd, serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let sd = SurrealDatetime::deserialize(deserializer)?;
        Ok(DateTime::from(sd))
    }
}

/// Module for serializing optional chrono DateTime to SurrealDB datetime format
mod surreal_datetime_opt {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};
    use surrealdb::sql::Datetime as SurrealDatetime;

    pub fn serialize<S>(date: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(d) => {
                let sd = SurrealDatetime::from(*d);
                serde::Serialize::serialize(&Some(sd), serializer)
            }
            None => serde::Serialize::serialize(&None::<SurrealDatetime>, serializer),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let sd = Option::<SurrealDatetime>::deserialize(deserializer)?;
        Ok(sd.map(DateTime::from))
    }
}

/// Profile row stored in SurrealDB.
///
/// `dsa_skill_source` is persisted as a plain string so the conditional
/// precedence statement can compare it in SurrealQL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileRow {
    /// SurrealDB record ID
    pub id: Option<surrealdb::sql::Thing>,
    /// External profile identifier (unique)
    pub profile_id: String,
    #[serde(default)]
    pub frontend_skill: Option<f64>,
    #[serde(default)]
    pub backend_skill: Option<f64>,
    #[serde(default)]
    pub dsa_skill: Option<f64>,
    /// Source tag guarding `dsa_skill` ("repositories" | "submissions")
    #[serde(default)]
    pub dsa_skill_source: Option<String>,
    #[serde(default)]
    pub github_handle: Option<String>,
    #[serde(default)]
    pub leetcode_handle: Option<String>,
    /// Repository evidence summary (languages, frameworks, top repos)
    #[serde(default)]
    pub github_stats: Option<serde_json::Value>,
    /// Submission evidence summary (solved counts, topic tiers)
    #[serde(default)]
    pub topic_stats: Option<serde_json::Value>,
    #[serde(default, with = "surreal_datetime_opt")]
    pub last_analyzed_at: Option<DateTime<Utc>>,
    pub verified: bool,
    pub manual_override: bool,
    #[serde(with = "surreal_datetime")]
    pub created_at: DateTime<Utc>,
}

impl ProfileRow {
    /// Build a row from a trait-level profile.
    pub fn from_profile(profile: SkillProfile) -> Self {
        ProfileRow {
            id: None,
            profile_id: profile.profile_id.0,
            frontend_skill: profile.frontend_skill,
            backend_skill: profile.backend_skill,
            dsa_skill: profile.dsa_skill,
            dsa_skill_source: profile.dsa_skill_source.map(|s| s.as_str().to_string()),
            github_handle: profile.github_handle,
            leetcode_handle: profile.leetcode_handle,
            github_stats: profile.github_stats,
            topic_stats: profile.topic_stats,
            last_analyzed_at: profile.last_analyzed_at,
            verified: profile.verified,
            manual_override: profile.manual_override,
            created_at: profile.created_at,
        }
    }

    /// Convert a row back into a trait-level profile.
    pub fn into_profile(self) -> StoreResult<SkillProfile> {
        let dsa_skill_source = match self.dsa_skill_source {
            Some(tag) => Some(tag.parse().map_err(|_| {
                StoreError::Serialization(format!("unknown dsa_skill_source tag: {tag}"))
            })?),
            None => None,
        };

        Ok(SkillProfile {
            profile_id: ProfileId(self.profile_id),
            frontend_skill: self.frontend_skill,
            backend_skill: self.backend_skill,
            dsa_skill: self.dsa_skill,
            dsa_skill_source,
            github_handle: self.github_handle,
            leetcode_handle: self.leetcode_handle,
            github_stats: self.github_stats,
            topic_stats: self.topic_stats,
            last_analyzed_at: self.last_analyzed_at,
            verified: self.verified,
            manual_override: self.manual_override,
            created_at: self.created_at,
        })
    }
}

/// Serializable form of the plain (untagged) half of a [`ProfilePatch`].
///
/// Absent fields are skipped entirely so `UPDATE ... MERGE $patch` never
/// sees them; the tagged `dsa_skill` write is excluded here because the
/// store applies it through a separate conditional statement.
#[derive(Debug, Clone, Serialize)]
pub struct PatchRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frontend_skill: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_skill: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_handle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leetcode_handle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_stats: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic_stats: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none", with = "surreal_datetime_opt")]
    pub last_analyzed_at: Option<DateTime<Utc>>,
}

impl PatchRow {
    pub fn from_patch(patch: &ProfilePatch) -> Self {
        PatchRow {
            frontend_skill: patch.frontend_skill,
            backend_skill: patch.backend_skill,
            github_handle: patch.github_handle.clone(),
            leetcode_handle: patch.leetcode_handle.clone(),
            github_stats: patch.github_stats.clone(),
            topic_stats: patch.topic_stats.clone(),
            last_analyzed_at: patch.last_analyzed_at,
        }
    }
}
