//! Error types for profile persistence.

use thiserror::Error;

/// Errors surfaced by profile stores.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No profile row matches the requested profile id.
    #[error("profile not found: {profile_id}")]
    ProfileNotFound { profile_id: String },

    /// The backend could not be reached (connection refused, handshake
    /// failure, credentials rejected).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The backend accepted the connection but a statement failed.
    #[error("store backend error: {0}")]
    Backend(String),

    /// A row or patch could not be serialized or deserialized.
    #[error("store serialization error: {0}")]
    Serialization(String),

    /// Schema or index setup failed during initialization.
    #[error("schema setup failed: {0}")]
    SchemaSetup(String),
}

impl StoreError {
    /// Whether a retry against the same backend could plausibly succeed.
    ///
    /// `Unavailable` and `Backend` cover transient conditions (the server
    /// restarting, a write conflict); the remaining variants are permanent
    /// for a given input.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_) | StoreError::Backend(_))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}
