//! In-memory fakes for storage traits (testing only)
//!
//! Provides `MemoryProfileStore`, which satisfies the `ProfileStore`
//! contract without any external dependencies, including the tagged
//! `dsa_skill` precedence rule.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::store_traits::*;

/// In-memory profile store backed by a `HashMap<profile_id, SkillProfile>`.
#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    profiles: Mutex<HashMap<String, SkillProfile>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a profile, replacing any existing row with the same id.
    pub fn insert(&self, profile: SkillProfile) {
        let mut profiles = self.profiles.lock().unwrap();
        profiles.insert(profile.profile_id.0.clone(), profile);
    }

    /// Seed a fresh profile with the given id and return it.
    pub fn insert_fresh(&self, profile_id: &str) -> SkillProfile {
        let profile = SkillProfile::new(ProfileId::from(profile_id));
        self.insert(profile.clone());
        profile
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn get_profile(&self, profile_id: &ProfileId) -> StoreResult<SkillProfile> {
        let profiles = self.profiles.lock().unwrap();
        profiles
            .get(&profile_id.0)
            .cloned()
            .ok_or_else(|| StoreError::ProfileNotFound {
                profile_id: profile_id.0.clone(),
            })
    }

    async fn update_fields(
        &self,
        profile_id: &ProfileId,
        patch: ProfilePatch,
    ) -> StoreResult<()> {
        let mut profiles = self.profiles.lock().unwrap();
        let profile =
            profiles
                .get_mut(&profile_id.0)
                .ok_or_else(|| StoreError::ProfileNotFound {
                    profile_id: profile_id.0.clone(),
                })?;

        if let Some(value) = patch.frontend_skill {
            profile.frontend_skill = Some(value);
        }
        if let Some(value) = patch.backend_skill {
            profile.backend_skill = Some(value);
        }
        if let Some(handle) = patch.github_handle {
            profile.github_handle = Some(handle);
        }
        if let Some(handle) = patch.leetcode_handle {
            profile.leetcode_handle = Some(handle);
        }
        if let Some(stats) = patch.github_stats {
            profile.github_stats = Some(stats);
        }
        if let Some(stats) = patch.topic_stats {
            profile.topic_stats = Some(stats);
        }
        if let Some(at) = patch.last_analyzed_at {
            profile.last_analyzed_at = Some(at);
        }

        if let Some(score) = patch.dsa_skill {
            let allowed = match profile.dsa_skill_source {
                None => true,
                Some(existing) => score.source.priority() >= existing.priority(),
            };
            if allowed {
                profile.dsa_skill = Some(score.value);
                profile.dsa_skill_source = Some(score.source);
            }
        }

        // The row exists even if every write was skipped, so the call
        // succeeds.
        Ok(())
    }
}
