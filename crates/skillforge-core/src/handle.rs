//! Validated external-platform handles.
//!
//! Every fetcher entry point takes a `&Handle`, so an empty or malformed
//! identifier is rejected before any network call is made.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Accepted handle syntax: alphanumeric start, then alphanumerics,
/// hyphens or underscores, at most 39 characters total. Matches the
/// intersection of GitHub and LeetCode username rules.
const HANDLE_PATTERN: &str = r"^[A-Za-z0-9][A-Za-z0-9_-]{0,38}$";

fn handle_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(HANDLE_PATTERN).expect("handle pattern is valid"))
}

/// Errors from handle validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandleError {
    #[error("handle is empty")]
    Empty,

    #[error("handle {0:?} is not a valid platform username")]
    InvalidSyntax(String),
}

/// A syntactically valid username on an external evidence platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(String);

impl Handle {
    /// Validate and wrap a raw identifier. Leading/trailing whitespace is
    /// trimmed before validation; interior whitespace is rejected.
    pub fn parse(raw: &str) -> Result<Self, HandleError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(HandleError::Empty);
        }
        if !handle_regex().is_match(trimmed) {
            return Err(HandleError::InvalidSyntax(trimmed.to_string()));
        }
        Ok(Handle(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Handle {
    type Err = HandleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Handle::parse(s)
    }
}
