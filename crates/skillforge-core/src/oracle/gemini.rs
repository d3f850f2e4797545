//! Gemini-backed scoring oracle client.
//!
//! Calls the `generateContent` REST endpoint and unwraps the completion
//! envelope down to the first candidate's text. Nothing inside the text is
//! parsed here.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::oracle::{OracleError, ScoringOracle};

/// Gemini client configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_base: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
}

impl GeminiConfig {
    /// Create a config from environment variables. Fails when
    /// `GEMINI_API_KEY` is unset; the real oracle cannot run without it.
    pub fn from_env() -> Result<Self, OracleError> {
        let api_key = std::env::var("GEMINI_API_KEY").map_err(|_| OracleError::Unavailable {
            reason: "GEMINI_API_KEY is not set".to_string(),
        })?;
        Ok(GeminiConfig {
            api_base: std::env::var("SKILLFORGE_GEMINI_API")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string()),
            api_key,
            model: std::env::var("SKILLFORGE_GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-2.5-flash".to_string()),
            timeout: Duration::from_secs(30),
        })
    }

    pub fn new(api_base: &str, api_key: &str, model: &str) -> Self {
        GeminiConfig {
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

// Response envelope; only the path to the completion text is decoded.

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Pull the first candidate's text out of a generateContent response.
///
/// Split from transport so it is unit-testable with canned JSON.
fn decode_completion(status: StatusCode, body: &str) -> Result<String, OracleError> {
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        return Err(OracleError::Unavailable {
            reason: format!("gemini returned {status}"),
        });
    }
    if !status.is_success() {
        return Err(OracleError::Unavailable {
            reason: format!("gemini rejected the request: {status}"),
        });
    }

    let response: GenerateResponse =
        serde_json::from_str(body).map_err(|e| OracleError::Unavailable {
            reason: format!("completion envelope did not decode: {e}"),
        })?;

    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
        .filter(|t| !t.is_empty())
        .ok_or(OracleError::EmptyCompletion)
}

/// Scoring oracle backed by the Gemini generateContent API.
pub struct GeminiOracle {
    config: GeminiConfig,
    http: reqwest::Client,
}

impl GeminiOracle {
    pub fn new(config: GeminiConfig) -> Result<Self, OracleError> {
        let http = reqwest::Client::builder()
            .user_agent("skillforge/0.1.0")
            .timeout(config.timeout)
            .build()
            .map_err(|e| OracleError::Unavailable {
                reason: format!("http client build failed: {e}"),
            })?;
        Ok(GeminiOracle { config, http })
    }

    pub fn from_env() -> Result<Self, OracleError> {
        Self::new(GeminiConfig::from_env()?)
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.config.api_base, self.config.model, self.config.api_key
        )
    }
}

#[async_trait]
impl ScoringOracle for GeminiOracle {
    async fn complete(&self, prompt: &str) -> Result<String, OracleError> {
        debug!(model = %self.config.model, prompt_len = prompt.len(), "calling scoring oracle");

        let response = self
            .http
            .post(self.endpoint())
            .json(&json!({
                "contents": [{ "parts": [{ "text": prompt }] }],
            }))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    OracleError::Timeout
                } else {
                    OracleError::Unavailable {
                        reason: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| OracleError::Unavailable {
            reason: format!("reading completion body failed: {e}"),
        })?;

        decode_completion(status, &body)
    }
}
