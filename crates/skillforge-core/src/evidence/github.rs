//! GitHub repository evidence fetcher.
//!
//! Lists a user's public repositories over the REST API, most recently
//! updated first, capped at one page of 100 so prompt size stays bounded.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::evidence::{EvidenceError, RepoRecord, RepositoryEvidence, MAX_RECORDS};
use crate::handle::Handle;

/// GitHub client configuration.
#[derive(Debug, Clone)]
pub struct GithubConfig {
    /// API base URL (override for tests or GitHub Enterprise).
    pub api_base: String,
    /// Optional bearer token; unauthenticated calls are rate-limited hard.
    pub token: Option<String>,
    pub user_agent: String,
    pub timeout: Duration,
}

const DEFAULT_API_BASE: &str = "https://api.github.com";

impl Default for GithubConfig {
    fn default() -> Self {
        GithubConfig {
            api_base: DEFAULT_API_BASE.to_string(),
            token: None,
            user_agent: "skillforge/0.1.0".to_string(),
            timeout: Duration::from_secs(15),
        }
    }
}

impl GithubConfig {
    /// Create a config from environment variables. `SKILLFORGE_GITHUB_API`
    /// overrides the API base, `GITHUB_TOKEN` supplies the bearer token.
    /// `default()` stays environment-independent.
    pub fn from_env() -> Self {
        GithubConfig {
            api_base: std::env::var("SKILLFORGE_GITHUB_API")
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
            token: std::env::var("GITHUB_TOKEN").ok(),
            ..Self::default()
        }
    }

    /// Create a config pointed at a specific API base (no token).
    pub fn new(api_base: &str) -> Self {
        GithubConfig {
            api_base: api_base.trim_end_matches('/').to_string(),
            token: None,
            user_agent: "skillforge/0.1.0".to_string(),
            timeout: Duration::from_secs(15),
        }
    }

    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }
}

/// One row of the GitHub list-repositories response. Only the fields the
/// normalizer consumes are decoded.
#[derive(Debug, Deserialize)]
struct GithubRepo {
    name: String,
    description: Option<String>,
    language: Option<String>,
    #[serde(default)]
    topics: Vec<String>,
}

/// Repository evidence fetcher backed by the GitHub REST API.
pub struct GithubRepoFetcher {
    config: GithubConfig,
    http: reqwest::Client,
}

impl GithubRepoFetcher {
    pub fn new(config: GithubConfig) -> Result<Self, EvidenceError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()
            .map_err(|e| EvidenceError::Transient {
                reason: format!("http client build failed: {e}"),
            })?;
        Ok(GithubRepoFetcher { config, http })
    }

    pub fn from_env() -> Result<Self, EvidenceError> {
        Self::new(GithubConfig::from_env())
    }

    fn repos_url(&self, handle: &Handle) -> String {
        format!(
            "{}/users/{}/repos?sort=updated&per_page={}",
            self.config.api_base.trim_end_matches('/'),
            handle,
            MAX_RECORDS
        )
    }
}

/// Map a GitHub response status + body into evidence records.
///
/// Split from transport so it is unit-testable with canned JSON.
fn decode_repos(
    handle: &Handle,
    status: StatusCode,
    body: &str,
) -> Result<Vec<RepoRecord>, EvidenceError> {
    if status == StatusCode::NOT_FOUND {
        return Err(EvidenceError::HandleNotFound {
            handle: handle.to_string(),
        });
    }
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        return Err(EvidenceError::Transient {
            reason: format!("github returned {status}"),
        });
    }
    if !status.is_success() {
        return Err(EvidenceError::Malformed {
            detail: format!("unexpected github status {status}"),
        });
    }

    let repos: Vec<GithubRepo> =
        serde_json::from_str(body).map_err(|e| EvidenceError::Malformed {
            detail: format!("repository list did not decode: {e}"),
        })?;
    if repos.is_empty() {
        return Err(EvidenceError::EmptyEvidence);
    }
    Ok(repos
        .into_iter()
        .take(MAX_RECORDS)
        .map(|r| RepoRecord {
            name: r.name,
            description: r.description,
            language: r.language,
            topics: r.topics,
        })
        .collect())
}

#[async_trait]
impl RepositoryEvidence for GithubRepoFetcher {
    async fn fetch(&self, handle: &Handle) -> Result<Vec<RepoRecord>, EvidenceError> {
        let url = self.repos_url(handle);
        debug!(handle = %handle, "fetching github repositories");

        let mut request = self.http.get(&url).header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(EvidenceError::from_transport)?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(EvidenceError::from_transport)?;

        let records = decode_repos(handle, status, &body)?;
        if records.len() == MAX_RECORDS {
            warn!(handle = %handle, "repository list truncated at cap");
        }
        Ok(records)
    }
}
