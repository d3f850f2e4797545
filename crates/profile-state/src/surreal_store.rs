//! SurrealDB-backed ProfileStore implementation
//!
//! Uses `schema::ProfileRow` and `schema::PatchRow` for persistence,
//! converting to/from `store_traits` types at the boundary.
//!
//! Patches are applied with `UPDATE ... MERGE`, never `CONTENT`, so a run
//! can only touch the columns it owns. The tagged `dsa_skill` write rides
//! in the same request as the merge; a single request is a single
//! transaction, so the precedence check and the write cannot interleave
//! with another run's patch.

use async_trait::async_trait;
use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::migrations;
use crate::schema::{PatchRow, ProfileRow};
use crate::store_traits::{ProfileId, ProfilePatch, ProfileStore, SkillProfile, StoreResult};

/// Environment variable naming the SurrealDB endpoint URL.
pub const ENV_DB_URL: &str = "SURREALDB_URL";
/// Environment variables for optional root credentials.
pub const ENV_DB_USER: &str = "SURREALDB_USER";
pub const ENV_DB_PASS: &str = "SURREALDB_PASS";
/// Environment variables overriding the namespace/database selection.
pub const ENV_DB_NS: &str = "SKILLFORGE_DB_NS";
pub const ENV_DB_NAME: &str = "SKILLFORGE_DB_NAME";

const DEFAULT_NS: &str = "skillforge";
const DEFAULT_DB: &str = "main";
const LOCAL_DB_PATH: &str = ".skillforge/db";

/// SurrealDB-backed implementation of [`ProfileStore`].
pub struct SurrealProfileStore {
    db: Surreal<Any>,
}

impl SurrealProfileStore {
    /// Create an in-memory instance for testing.
    ///
    /// Connects to `mem://`, selects `skillforge/main`, and runs
    /// `init_schema`.
    pub async fn in_memory() -> crate::Result<Self> {
        let store = Self::open("mem://", None, DEFAULT_NS, DEFAULT_DB).await?;
        info!("SurrealProfileStore connected (in-memory)");
        Ok(store)
    }

    /// Connect to an explicit endpoint without credentials.
    pub async fn connect(url: &str, namespace: &str, database: &str) -> crate::Result<Self> {
        let store = Self::open(url, None, namespace, database).await?;
        info!("SurrealProfileStore connected ({})", url);
        Ok(store)
    }

    /// Create from environment variables.
    ///
    /// Resolution order:
    /// 1. `SURREALDB_URL` (with root signin when `SURREALDB_USER` and
    ///    `SURREALDB_PASS` are both set)
    /// 2. Local persistence under `.skillforge/db` via surrealkv
    ///
    /// Namespace and database default to `skillforge/main` and can be
    /// overridden with `SKILLFORGE_DB_NS` / `SKILLFORGE_DB_NAME`.
    pub async fn from_env() -> crate::Result<Self> {
        let namespace = std::env::var(ENV_DB_NS).unwrap_or_else(|_| DEFAULT_NS.to_string());
        let database = std::env::var(ENV_DB_NAME).unwrap_or_else(|_| DEFAULT_DB.to_string());

        if let Ok(url) = std::env::var(ENV_DB_URL) {
            let auth = match (std::env::var(ENV_DB_USER), std::env::var(ENV_DB_PASS)) {
                (Ok(user), Ok(pass)) => Some((user, pass)),
                _ => None,
            };
            let store = Self::open(&url, auth, &namespace, &database).await?;
            info!("SurrealProfileStore connected ({})", url);
            return Ok(store);
        }

        // No endpoint configured, fall back to local persistence
        std::fs::create_dir_all(LOCAL_DB_PATH).map_err(|e| {
            StoreError::Unavailable(format!(
                "failed to create database directory {}: {}",
                LOCAL_DB_PATH, e
            ))
        })?;
        let url = format!("surrealkv://{}", LOCAL_DB_PATH);
        info!("no {} found, using local persistence: {}", ENV_DB_URL, url);
        Self::open(&url, None, &namespace, &database).await
    }

    async fn open(
        url: &str,
        auth: Option<(String, String)>,
        namespace: &str,
        database: &str,
    ) -> crate::Result<Self> {
        let db = surrealdb::engine::any::connect(url)
            .await
            .map_err(|e| StoreError::Unavailable(format!("failed to connect to {url}: {e}")))?;

        if let Some((username, password)) = auth {
            db.signin(surrealdb::opt::auth::Root {
                username: &username,
                password: &password,
            })
            .await
            .map_err(|e| StoreError::Unavailable(format!("root auth failed: {e}")))?;
        }

        db.use_ns(namespace)
            .use_db(database)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        migrations::init_schema(&db).await?;
        Ok(Self { db })
    }

    /// Insert a fresh profile row. The unique index on `profile_id`
    /// rejects duplicates.
    pub async fn create_profile(&self, profile: SkillProfile) -> StoreResult<()> {
        let row = ProfileRow::from_profile(profile);
        debug!(profile_id = %row.profile_id, "creating profile");

        let created: Option<ProfileRow> = self
            .db
            .create("profiles")
            .content(row)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        created
            .map(|_| ())
            .ok_or_else(|| StoreError::Backend("profile row was not created".to_string()))
    }

    // -- private helpers -----------------------------------------------------

    /// Fetch a profile row by external id, or ProfileNotFound.
    async fn fetch_profile(&self, pid: &str) -> StoreResult<ProfileRow> {
        let pid_owned = pid.to_string();
        let mut res = self
            .db
            .query("SELECT * FROM profiles WHERE profile_id = $pid")
            .bind(("pid", pid_owned))
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let rows: Vec<ProfileRow> = res
            .take(0)
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::ProfileNotFound {
                profile_id: pid.to_string(),
            })
    }
}

#[async_trait]
impl ProfileStore for SurrealProfileStore {
    async fn get_profile(&self, profile_id: &ProfileId) -> StoreResult<SkillProfile> {
        let row = self.fetch_profile(&profile_id.0).await?;
        row.into_profile()
    }

    async fn update_fields(
        &self,
        profile_id: &ProfileId,
        patch: ProfilePatch,
    ) -> StoreResult<()> {
        let pid = profile_id.0.clone();
        let patch_row = PatchRow::from_patch(&patch);

        debug!(profile_id = %profile_id, "applying profile patch");

        let mut res = match patch.dsa_skill {
            Some(score) => {
                // The merge and the gated write share one request, hence
                // one transaction. The gated statement matching zero rows
                // means a higher-priority source already owns the column.
                let overridable: Vec<String> = score
                    .source
                    .overridable()
                    .into_iter()
                    .map(|s| s.as_str().to_string())
                    .collect();

                self.db
                    .query(
                        "UPDATE profiles MERGE $patch WHERE profile_id = $pid; \
                         UPDATE profiles SET dsa_skill = $score, dsa_skill_source = $src \
                             WHERE profile_id = $pid \
                             AND (dsa_skill_source = NONE OR dsa_skill_source IN $overridable)",
                    )
                    .bind(("pid", pid.clone()))
                    .bind(("patch", patch_row))
                    .bind(("score", score.value))
                    .bind(("src", score.source.as_str().to_string()))
                    .bind(("overridable", overridable))
                    .await
                    .map_err(|e| StoreError::Backend(e.to_string()))?
            }
            None => self
                .db
                .query("UPDATE profiles MERGE $patch WHERE profile_id = $pid")
                .bind(("pid", pid.clone()))
                .bind(("patch", patch_row))
                .await
                .map_err(|e| StoreError::Backend(e.to_string()))?,
        };

        let merged: Vec<ProfileRow> = res
            .take(0)
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        if merged.is_empty() {
            return Err(StoreError::ProfileNotFound { profile_id: pid });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store_traits::{SourceId, TaggedScore};

    #[tokio::test]
    async fn test_connection_and_schema_creation() {
        let store = SurrealProfileStore::in_memory().await;
        assert!(store.is_ok());
    }

    #[tokio::test]
    async fn test_create_and_get_round_trip() {
        let store = SurrealProfileStore::in_memory().await.unwrap();
        let profile = SkillProfile::new(ProfileId::from("p-rt"));
        store.create_profile(profile.clone()).await.unwrap();

        let back = store.get_profile(&ProfileId::from("p-rt")).await.unwrap();
        assert_eq!(back.profile_id, profile.profile_id);
        assert!(back.frontend_skill.is_none());
        assert!(!back.verified);
    }

    #[tokio::test]
    async fn test_duplicate_profile_id_is_rejected() {
        let store = SurrealProfileStore::in_memory().await.unwrap();
        store
            .create_profile(SkillProfile::new(ProfileId::from("p-dup")))
            .await
            .unwrap();
        let err = store
            .create_profile(SkillProfile::new(ProfileId::from("p-dup")))
            .await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn test_gated_write_skipped_is_not_an_error() {
        let store = SurrealProfileStore::in_memory().await.unwrap();
        store
            .create_profile(SkillProfile::new(ProfileId::from("p-gate")))
            .await
            .unwrap();

        let submission = ProfilePatch {
            dsa_skill: Some(TaggedScore::new(88.0, SourceId::Submissions)),
            ..Default::default()
        };
        store
            .update_fields(&ProfileId::from("p-gate"), submission)
            .await
            .unwrap();

        // Lower-priority write is silently skipped
        let repo = ProfilePatch {
            dsa_skill: Some(TaggedScore::new(30.0, SourceId::Repositories)),
            ..Default::default()
        };
        store
            .update_fields(&ProfileId::from("p-gate"), repo)
            .await
            .unwrap();

        let profile = store.get_profile(&ProfileId::from("p-gate")).await.unwrap();
        assert_eq!(profile.dsa_skill, Some(88.0));
        assert_eq!(profile.dsa_skill_source, Some(SourceId::Submissions));
    }
}
