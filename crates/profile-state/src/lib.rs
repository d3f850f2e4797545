//! Profile-State: SurrealDB Backend for Skillforge
//!
//! This crate provides the persistence layer for verified skill profiles.
//! It handles all I/O with SurrealDB, exposing a field-scoped patch API so
//! analysis runs never replace whole rows.
//!
//! ## Key Components
//!
//! - `ProfileStore`: the persistence trait the pipeline writes through
//! - `SurrealProfileStore`: SurrealDB-backed implementation
//! - `MemoryProfileStore`: in-memory fake for tests
//! - `ProfilePatch` / `TaggedScore`: field-scoped updates with source
//!   precedence on the shared `dsa_skill` column

mod error;
pub mod fakes;
mod migrations;
mod schema;
pub mod store_traits;
pub mod surreal_store;

pub use error::StoreError;
pub use fakes::MemoryProfileStore;
pub use schema::ProfileRow;
pub use store_traits::{
    ProfileId, ProfilePatch, ProfileStore, SkillProfile, SourceId, StoreResult, TaggedScore,
};
pub use surreal_store::SurrealProfileStore;

/// Result type for profile-state operations
pub type Result<T> = std::result::Result<T, StoreError>;
