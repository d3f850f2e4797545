//! Pipeline orchestration: one analysis run from trigger to merged profile.
//!
//! A run walks `Fetching -> Normalizing -> Scoring -> Validating -> Merging
//! -> Done`, with an absorbing failure state reachable from any of them.
//! The orchestrator is the only component that decides retry versus
//! terminal failure, and it never lets an error escape its boundary: every
//! outcome is a typed [`RunReport`].
//!
//! On the success path there is exactly one fetch sequence, at most one
//! oracle call plus bounded retries, and at most one profile write. On any
//! terminal failure zero profile writes occur.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, Instrument};
use uuid::Uuid;

use profile_state::{ProfileId, ProfilePatch, ProfileStore, SourceId, StoreError};

use crate::evidence::{EvidenceError, RepositoryEvidence, SubmissionEvidence};
use crate::handle::Handle;
use crate::merge::{build_repository_patch, build_submission_patch};
use crate::normalize::{normalize_repos, normalize_submissions};
use crate::obs::{emit_run_finished, emit_run_started, emit_stage_failed};
use crate::oracle::prompt::{build_repository_prompt, build_submission_prompt};
use crate::oracle::{OracleError, ScoringOracle};
use crate::validate::{validate, OutputSchema, ScorePayload};

/// Bounded retry budget for one run.
///
/// Transient fetch/oracle/merge failures are retried up to `max_attempts`
/// total tries with a short fixed delay; validation failures re-prompt the
/// oracle at most `max_reprompts` extra times. No unbounded backoff: a run
/// is a synchronous, user-triggered operation, not a background job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub max_reprompts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 2,
            retry_delay: Duration::from_millis(200),
            max_reprompts: 1,
        }
    }
}

/// Pipeline state machine positions, recorded in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStage {
    Idle,
    Fetching,
    Normalizing,
    Scoring,
    Validating,
    Merging,
    Done,
}

impl RunStage {
    pub fn as_str(self) -> &'static str {
        match self {
            RunStage::Idle => "idle",
            RunStage::Fetching => "fetching",
            RunStage::Normalizing => "normalizing",
            RunStage::Scoring => "scoring",
            RunStage::Validating => "validating",
            RunStage::Merging => "merging",
            RunStage::Done => "done",
        }
    }
}

/// Failure taxonomy surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Empty or malformed handle, rejected before any I/O.
    InvalidHandle,
    /// Evidence source transient failure, retry budget exhausted.
    SourceUnavailable,
    /// The handle does not exist on the evidence platform.
    SourceNotFound,
    /// The handle exists but has zero usable records.
    SourceEmpty,
    /// The evidence response could not be decoded.
    MalformedEvidence,
    /// Oracle transient failure, retry budget exhausted.
    OracleUnavailable,
    /// Oracle output failed validation, re-prompt budget exhausted.
    OracleOutputInvalid,
    /// Profile store transient failure, retry budget exhausted.
    PersistenceUnavailable,
    /// The profile row does not exist; a precondition violation by the
    /// caller.
    ProfileNotFound,
    /// The detached run task panicked or was cancelled before it could
    /// report. Indicates a bug, not a pipeline failure mode.
    Aborted,
}

/// Uniform result of one analysis run. Never an `Err`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub profile_id: String,
    pub source: SourceId,
    pub success: bool,
    /// Short human-readable reason, suitable for direct display.
    pub detail: String,
    pub failure: Option<FailureKind>,
    pub stage_reached: RunStage,
}

struct RunFailure {
    stage: RunStage,
    kind: FailureKind,
    detail: String,
}

fn evidence_failure(err: &EvidenceError) -> FailureKind {
    match err {
        EvidenceError::HandleNotFound { .. } => FailureKind::SourceNotFound,
        EvidenceError::EmptyEvidence => FailureKind::SourceEmpty,
        EvidenceError::Transient { .. } => FailureKind::SourceUnavailable,
        EvidenceError::Malformed { .. } => FailureKind::MalformedEvidence,
    }
}

fn store_failure(err: &StoreError) -> FailureKind {
    match err {
        StoreError::ProfileNotFound { .. } => FailureKind::ProfileNotFound,
        _ => FailureKind::PersistenceUnavailable,
    }
}

/// The skill verification and scoring pipeline.
///
/// All collaborators are injected, so tests substitute fakes for the
/// evidence platforms, the oracle, and the store.
#[derive(Clone)]
pub struct AnalysisPipeline {
    repositories: Arc<dyn RepositoryEvidence>,
    submissions: Arc<dyn SubmissionEvidence>,
    oracle: Arc<dyn ScoringOracle>,
    store: Arc<dyn ProfileStore>,
    policy: RetryPolicy,
}

impl AnalysisPipeline {
    pub fn new(
        repositories: Arc<dyn RepositoryEvidence>,
        submissions: Arc<dyn SubmissionEvidence>,
        oracle: Arc<dyn ScoringOracle>,
        store: Arc<dyn ProfileStore>,
    ) -> Self {
        AnalysisPipeline {
            repositories,
            submissions,
            oracle,
            store,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Execute one analysis run for `source` against `profile_id`.
    ///
    /// Synchronous from the caller's perspective; every failure mode is
    /// captured in the returned report.
    pub async fn run(&self, profile_id: &ProfileId, handle: &str, source: SourceId) -> RunReport {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("skillforge.run", run_id = %run_id, source = %source.as_str());
        async {
            emit_run_started(run_id, profile_id.as_str(), source.as_str());

            let report = self.run_inner(run_id, profile_id, handle, source).await;
            emit_run_finished(
                run_id,
                report.success,
                report.stage_reached.as_str(),
                &report.detail,
            );
            report
        }
        .instrument(span)
        .await
    }

    /// Execute one run detached from the calling context.
    ///
    /// The run is spawned onto the runtime before being awaited, so if the
    /// triggering context is abandoned the analysis still completes and its
    /// merge still lands. A live caller sees the same report `run` returns.
    pub async fn trigger_analysis(
        self: Arc<Self>,
        profile_id: ProfileId,
        handle: String,
        source: SourceId,
    ) -> RunReport {
        let pipeline = self.clone();
        let task_profile = profile_id.clone();
        let task = tokio::spawn(async move {
            pipeline.run(&task_profile, &handle, source).await
        });

        match task.await {
            Ok(report) => report,
            // The spawned run panicked; surface it as a failed report
            // rather than propagating the panic.
            Err(join_err) => RunReport {
                run_id: Uuid::new_v4(),
                profile_id: profile_id.to_string(),
                source,
                success: false,
                detail: format!("analysis task aborted: {join_err}"),
                failure: Some(FailureKind::Aborted),
                stage_reached: RunStage::Idle,
            },
        }
    }

    async fn run_inner(
        &self,
        run_id: Uuid,
        profile_id: &ProfileId,
        handle: &str,
        source: SourceId,
    ) -> RunReport {
        let fail = |stage: RunStage, kind: FailureKind, detail: String| RunReport {
            run_id,
            profile_id: profile_id.to_string(),
            source,
            success: false,
            detail,
            failure: Some(kind),
            stage_reached: stage,
        };

        // Fail fast: no network call for a bad handle.
        let handle = match Handle::parse(handle) {
            Ok(h) => h,
            Err(e) => return fail(RunStage::Idle, FailureKind::InvalidHandle, e.to_string()),
        };

        let patch = match source {
            SourceId::Repositories => self.run_repositories(run_id, &handle).await,
            SourceId::Submissions => self.run_submissions(run_id, &handle).await,
        };
        let patch = match patch {
            Ok(p) => p,
            Err(f) => return fail(f.stage, f.kind, f.detail),
        };

        // Merge is the single profile write of the run.
        let merged = self
            .with_retry(run_id, RunStage::Merging, StoreError::is_transient, || {
                self.store.update_fields(profile_id, patch.clone())
            })
            .await;
        if let Err(e) = merged {
            return fail(RunStage::Merging, store_failure(&e), e.to_string());
        }

        info!(run_id = %run_id, profile_id = %profile_id, "skill profile updated");
        RunReport {
            run_id,
            profile_id: profile_id.to_string(),
            source,
            success: true,
            detail: format!("skill profile updated from {source} evidence for {handle}"),
            failure: None,
            stage_reached: RunStage::Done,
        }
    }

    async fn run_repositories(
        &self,
        run_id: Uuid,
        handle: &Handle,
    ) -> Result<ProfilePatch, RunFailure> {
        let records = self
            .with_retry(run_id, RunStage::Fetching, EvidenceError::is_transient, || {
                self.repositories.fetch(handle)
            })
            .await
            .map_err(|e| RunFailure {
                stage: RunStage::Fetching,
                kind: evidence_failure(&e),
                detail: e.to_string(),
            })?;

        let summary = normalize_repos(&records);
        let prompt = build_repository_prompt(handle, &summary);
        let payload = self
            .score_and_validate(run_id, &prompt, &OutputSchema::repository())
            .await?;

        Ok(build_repository_patch(handle, &payload, &summary, Utc::now()))
    }

    async fn run_submissions(
        &self,
        run_id: Uuid,
        handle: &Handle,
    ) -> Result<ProfilePatch, RunFailure> {
        let activity = self
            .with_retry(run_id, RunStage::Fetching, EvidenceError::is_transient, || {
                self.submissions.fetch(handle)
            })
            .await
            .map_err(|e| RunFailure {
                stage: RunStage::Fetching,
                kind: evidence_failure(&e),
                detail: e.to_string(),
            })?;

        let summary = normalize_submissions(&activity);
        let prompt = build_submission_prompt(handle, &summary);
        let payload = self
            .score_and_validate(run_id, &prompt, &OutputSchema::submission())
            .await?;

        Ok(build_submission_patch(handle, &payload, &summary, Utc::now()))
    }

    /// Call the oracle and validate its output, re-prompting up to the
    /// policy's budget when validation fails. Re-prompting an identical
    /// prompt can legitimately help against a non-deterministic oracle,
    /// but never indefinitely.
    async fn score_and_validate(
        &self,
        run_id: Uuid,
        prompt: &str,
        schema: &OutputSchema,
    ) -> Result<ScorePayload, RunFailure> {
        let mut attempt = 0u32;
        loop {
            let raw = self
                .with_retry(run_id, RunStage::Scoring, OracleError::is_transient, || {
                    self.oracle.complete(prompt)
                })
                .await
                .map_err(|e| RunFailure {
                    stage: RunStage::Scoring,
                    kind: FailureKind::OracleUnavailable,
                    detail: e.to_string(),
                })?;

            match validate(&raw, schema) {
                Ok(payload) => return Ok(payload),
                Err(e) if attempt < self.policy.max_reprompts => {
                    attempt += 1;
                    emit_stage_failed(run_id, RunStage::Validating.as_str(), attempt, &e);
                }
                Err(e) => {
                    return Err(RunFailure {
                        stage: RunStage::Validating,
                        kind: FailureKind::OracleOutputInvalid,
                        detail: e.to_string(),
                    })
                }
            }
        }
    }

    /// Run `op` with the policy's bounded retry budget for transient
    /// failures. Non-transient errors return immediately.
    async fn with_retry<T, E, F, Fut>(
        &self,
        run_id: Uuid,
        stage: RunStage,
        is_transient: fn(&E) -> bool,
        mut op: F,
    ) -> Result<T, E>
    where
        E: std::fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt = 1u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if is_transient(&e) && attempt < self.policy.max_attempts => {
                    emit_stage_failed(run_id, stage.as_str(), attempt, &e);
                    attempt += 1;
                    tokio::time::sleep(self.policy.retry_delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
