//! LeetCode submission evidence fetcher.
//!
//! Queries the public GraphQL endpoint for per-topic solved counts, the
//! global accepted total, and the user's ranking. A null `matchedUser` is a
//! missing handle, which is distinct from a user with zero solved problems.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::evidence::{EvidenceError, SubmissionActivity, SubmissionEvidence, TopicRecord};
use crate::handle::Handle;

const SOLVED_QUERY: &str = r#"
query userProblemsSolved($username: String!) {
    matchedUser(username: $username) {
        submitStats {
            acSubmissionNum {
                difficulty
                count
            }
        }
        profile {
            ranking
        }
        tagProblemCounts {
            advanced { tagName tagSlug problemsSolved }
            intermediate { tagName tagSlug problemsSolved }
            fundamental { tagName tagSlug problemsSolved }
        }
    }
}
"#;

/// LeetCode client configuration.
#[derive(Debug, Clone)]
pub struct LeetcodeConfig {
    pub graphql_url: String,
    pub user_agent: String,
    pub timeout: Duration,
}

const DEFAULT_GRAPHQL_URL: &str = "https://leetcode.com/graphql";

impl Default for LeetcodeConfig {
    fn default() -> Self {
        LeetcodeConfig {
            graphql_url: DEFAULT_GRAPHQL_URL.to_string(),
            user_agent: "skillforge/0.1.0".to_string(),
            timeout: Duration::from_secs(15),
        }
    }
}

impl LeetcodeConfig {
    /// Create a config from environment variables. `SKILLFORGE_LEETCODE_API`
    /// overrides the GraphQL endpoint. `default()` stays
    /// environment-independent.
    pub fn from_env() -> Self {
        LeetcodeConfig {
            graphql_url: std::env::var("SKILLFORGE_LEETCODE_API")
                .unwrap_or_else(|_| DEFAULT_GRAPHQL_URL.to_string()),
            ..Self::default()
        }
    }

    pub fn new(graphql_url: &str) -> Self {
        LeetcodeConfig {
            graphql_url: graphql_url.to_string(),
            user_agent: "skillforge/0.1.0".to_string(),
            timeout: Duration::from_secs(15),
        }
    }
}

// GraphQL response envelope. Decoded permissively: the topic buckets may be
// absent for accounts that never tagged a solve.

#[derive(Debug, Deserialize)]
struct GraphqlEnvelope {
    data: Option<GraphqlData>,
}

#[derive(Debug, Deserialize)]
struct GraphqlData {
    #[serde(rename = "matchedUser")]
    matched_user: Option<MatchedUser>,
}

#[derive(Debug, Deserialize)]
struct MatchedUser {
    #[serde(rename = "submitStats")]
    submit_stats: SubmitStats,
    profile: UserProfile,
    #[serde(rename = "tagProblemCounts")]
    tag_problem_counts: Option<TagProblemCounts>,
}

#[derive(Debug, Deserialize)]
struct SubmitStats {
    #[serde(rename = "acSubmissionNum")]
    ac_submission_num: Vec<DifficultyCount>,
}

#[derive(Debug, Deserialize)]
struct DifficultyCount {
    difficulty: String,
    count: u32,
}

#[derive(Debug, Deserialize)]
struct UserProfile {
    ranking: u64,
}

#[derive(Debug, Deserialize, Default)]
struct TagProblemCounts {
    #[serde(default)]
    advanced: Vec<TagCount>,
    #[serde(default)]
    intermediate: Vec<TagCount>,
    #[serde(default)]
    fundamental: Vec<TagCount>,
}

#[derive(Debug, Deserialize)]
struct TagCount {
    #[serde(rename = "tagName")]
    tag_name: String,
    #[serde(rename = "tagSlug")]
    tag_slug: String,
    #[serde(rename = "problemsSolved")]
    problems_solved: u32,
}

/// Map a LeetCode response status + body into submission activity.
///
/// Split from transport so it is unit-testable with canned JSON.
fn decode_activity(
    handle: &Handle,
    status: StatusCode,
    body: &str,
) -> Result<SubmissionActivity, EvidenceError> {
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        return Err(EvidenceError::Transient {
            reason: format!("leetcode returned {status}"),
        });
    }
    if !status.is_success() {
        return Err(EvidenceError::Malformed {
            detail: format!("unexpected leetcode status {status}"),
        });
    }

    let envelope: GraphqlEnvelope =
        serde_json::from_str(body).map_err(|e| EvidenceError::Malformed {
            detail: format!("graphql envelope did not decode: {e}"),
        })?;

    let user = envelope
        .data
        .and_then(|d| d.matched_user)
        .ok_or_else(|| EvidenceError::HandleNotFound {
            handle: handle.to_string(),
        })?;

    let total_solved = user
        .submit_stats
        .ac_submission_num
        .iter()
        .find(|c| c.difficulty == "All")
        .map(|c| c.count)
        .unwrap_or(0);
    if total_solved == 0 {
        return Err(EvidenceError::EmptyEvidence);
    }

    let solved_by_difficulty = user
        .submit_stats
        .ac_submission_num
        .iter()
        .filter(|c| c.difficulty != "All")
        .map(|c| (c.difficulty.clone(), c.count))
        .collect();

    let tags = user.tag_problem_counts.unwrap_or_default();
    let topics = tags
        .fundamental
        .into_iter()
        .chain(tags.intermediate)
        .chain(tags.advanced)
        .map(|t| TopicRecord {
            tag_name: t.tag_name,
            tag_slug: t.tag_slug,
            problems_solved: t.problems_solved,
        })
        .collect();

    Ok(SubmissionActivity {
        topics,
        total_solved,
        ranking: user.profile.ranking,
        solved_by_difficulty,
    })
}

/// Submission evidence fetcher backed by the LeetCode GraphQL API.
pub struct LeetcodeSubmissionFetcher {
    config: LeetcodeConfig,
    http: reqwest::Client,
}

impl LeetcodeSubmissionFetcher {
    pub fn new(config: LeetcodeConfig) -> Result<Self, EvidenceError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()
            .map_err(|e| EvidenceError::Transient {
                reason: format!("http client build failed: {e}"),
            })?;
        Ok(LeetcodeSubmissionFetcher { config, http })
    }

    pub fn from_env() -> Result<Self, EvidenceError> {
        Self::new(LeetcodeConfig::from_env())
    }
}

#[async_trait]
impl SubmissionEvidence for LeetcodeSubmissionFetcher {
    async fn fetch(&self, handle: &Handle) -> Result<SubmissionActivity, EvidenceError> {
        debug!(handle = %handle, "fetching leetcode submission stats");

        let response = self
            .http
            .post(&self.config.graphql_url)
            .json(&json!({
                "query": SOLVED_QUERY,
                "variables": { "username": handle.as_str() },
            }))
            .send()
            .await
            .map_err(EvidenceError::from_transport)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(EvidenceError::from_transport)?;

        decode_activity(handle, status, &body)
    }
}
