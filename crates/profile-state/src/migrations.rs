//! SurrealDB schema initialization for the profiles table.
//!
//! Runs once per connection; every statement is idempotent so repeated
//! calls are safe.

use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::store_traits::StoreResult;

/// Initialize the Skillforge schema.
///
/// Safe to call multiple times (idempotent).
pub async fn init_schema(db: &Surreal<Any>) -> StoreResult<()> {
    info!("initializing skillforge profile schema");
    init_profiles_table(db).await?;
    info!("profile schema initialization complete");
    Ok(())
}

/// Initialize the `profiles` table with constraints and indexes.
///
/// Schema:
/// ```text
/// TABLE profiles {
///   profile_id:        STRING (primary key, unique)
///   frontend_skill:    NUMBER? (0..=100)
///   backend_skill:     NUMBER? (0..=100)
///   dsa_skill:         NUMBER? (0..=100)
///   dsa_skill_source:  STRING? (enum: repositories | submissions)
///   github_handle:     STRING?
///   leetcode_handle:   STRING?
///   github_stats:      OBJECT?
///   topic_stats:       OBJECT?
///   last_analyzed_at:  DATETIME?
///   verified:          BOOL
///   manual_override:   BOOL
///   created_at:        DATETIME
/// }
/// ```
///
/// Constraints:
/// - `profile_id` is unique (one row per profile)
/// - Score ranges and the `dsa_skill_source` precedence rule are enforced
///   by the store, not the schema
async fn init_profiles_table(db: &Surreal<Any>) -> StoreResult<()> {
    debug!("initializing profiles table");

    let sql = r#"
        DEFINE TABLE profiles
            SCHEMALESS
            PERMISSIONS
                FOR create FULL
                FOR select FULL
                FOR update FULL
                FOR delete NONE;

        -- One row per external profile id
        DEFINE INDEX idx_profile_id ON TABLE profiles COLUMNS profile_id UNIQUE;

        -- Index handles for reverse lookup (which profile claims this account)
        DEFINE INDEX idx_github_handle ON TABLE profiles COLUMNS github_handle;
        DEFINE INDEX idx_leetcode_handle ON TABLE profiles COLUMNS leetcode_handle;

        -- Index last_analyzed_at for staleness sweeps
        DEFINE INDEX idx_last_analyzed_at ON TABLE profiles COLUMNS last_analyzed_at;
    "#;

    db.query(sql)
        .await
        .map_err(|e| StoreError::SchemaSetup(e.to_string()))?;
    info!("✓ profiles table initialized");
    Ok(())
}
