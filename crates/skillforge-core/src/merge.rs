//! Profile merge engine: validated payload -> field-scoped patch.
//!
//! Each evidence source owns a fixed set of profile columns. A merge
//! writes exactly those columns, the source's stats blob, and the analysis
//! timestamp; every other column stays untouched. The shared `dsa_skill`
//! column travels as a [`TaggedScore`] so the store can enforce
//! submission-source precedence atomically.

use chrono::{DateTime, Utc};
use serde_json::json;

use profile_state::{ProfilePatch, SourceId, TaggedScore};

use crate::handle::Handle;
use crate::normalize::{RepoSummary, SubmissionSummary};
use crate::validate::ScorePayload;

/// Columns written by the repository source, timestamp aside.
pub const REPOSITORY_FIELDS: &[&str] = &[
    "frontend_skill",
    "backend_skill",
    "dsa_skill",
    "github_handle",
    "github_stats",
];

/// Columns written by the submission source, timestamp aside.
pub const SUBMISSION_FIELDS: &[&str] =
    &["dsa_skill", "leetcode_handle", "topic_stats"];

/// Stats blob for the repository source: opaque display aggregate.
pub fn repository_stats(summary: &RepoSummary, payload: &ScorePayload) -> serde_json::Value {
    json!({
        "languages": summary.languages,
        "frameworks": payload.lists.get("frameworks").cloned().unwrap_or_default(),
        "top_repos": summary.top_repo_names,
    })
}

/// Stats blob for the submission source.
pub fn submission_stats(summary: &SubmissionSummary) -> serde_json::Value {
    json!({
        "topics": summary.topics,
        "total_solved": summary.total_solved,
        "ranking": summary.ranking,
        "solved_by_difficulty": summary.solved_by_difficulty,
    })
}

/// Build the repository source's patch.
pub fn build_repository_patch(
    handle: &Handle,
    payload: &ScorePayload,
    summary: &RepoSummary,
    now: DateTime<Utc>,
) -> ProfilePatch {
    ProfilePatch {
        frontend_skill: payload.score("frontend"),
        backend_skill: payload.score("backend"),
        dsa_skill: payload
            .score("dsa")
            .map(|v| TaggedScore::new(v, SourceId::Repositories)),
        github_handle: Some(handle.to_string()),
        github_stats: Some(repository_stats(summary, payload)),
        last_analyzed_at: Some(now),
        ..Default::default()
    }
}

/// Build the submission source's patch.
pub fn build_submission_patch(
    handle: &Handle,
    payload: &ScorePayload,
    summary: &SubmissionSummary,
    now: DateTime<Utc>,
) -> ProfilePatch {
    ProfilePatch {
        dsa_skill: payload
            .score("dsa")
            .map(|v| TaggedScore::new(v, SourceId::Submissions)),
        leetcode_handle: Some(handle.to_string()),
        topic_stats: Some(submission_stats(summary)),
        last_analyzed_at: Some(now),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn payload(scores: &[(&str, f64)], frameworks: &[&str]) -> ScorePayload {
        let mut lists = BTreeMap::new();
        if !frameworks.is_empty() {
            lists.insert(
                "frameworks".to_string(),
                frameworks.iter().map(|s| s.to_string()).collect(),
            );
        }
        ScorePayload {
            scores: scores.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            lists,
            rationale: "test".to_string(),
        }
    }

    fn repo_summary() -> RepoSummary {
        RepoSummary {
            languages: [("TypeScript".to_string(), 2), ("Python".to_string(), 1)]
                .into_iter()
                .collect(),
            repos: vec![],
            top_repo_names: vec!["webapp".to_string()],
        }
    }

    #[test]
    fn repository_patch_writes_only_owned_columns() {
        let handle = Handle::parse("alice").unwrap();
        let p = payload(
            &[("frontend", 80.0), ("backend", 40.0), ("dsa", 55.0)],
            &["React"],
        );
        let patch = build_repository_patch(&handle, &p, &repo_summary(), Utc::now());

        assert_eq!(patch.frontend_skill, Some(80.0));
        assert_eq!(patch.backend_skill, Some(40.0));
        assert_eq!(
            patch.dsa_skill,
            Some(TaggedScore::new(55.0, SourceId::Repositories))
        );
        assert_eq!(patch.github_handle.as_deref(), Some("alice"));
        assert!(patch.github_stats.is_some());
        assert!(patch.last_analyzed_at.is_some());
        // Submission-owned columns are untouched.
        assert!(patch.leetcode_handle.is_none());
        assert!(patch.topic_stats.is_none());
    }

    #[test]
    fn submission_patch_writes_only_owned_columns() {
        let handle = Handle::parse("alice").unwrap();
        let p = payload(&[("dsa", 72.0)], &[]);
        let summary = SubmissionSummary {
            topics: BTreeMap::new(),
            total_solved: 120,
            ranking: 45210,
            solved_by_difficulty: BTreeMap::new(),
        };
        let patch = build_submission_patch(&handle, &p, &summary, Utc::now());

        assert_eq!(
            patch.dsa_skill,
            Some(TaggedScore::new(72.0, SourceId::Submissions))
        );
        assert_eq!(patch.leetcode_handle.as_deref(), Some("alice"));
        assert!(patch.topic_stats.is_some());
        // Repository-owned columns are untouched.
        assert!(patch.frontend_skill.is_none());
        assert!(patch.backend_skill.is_none());
        assert!(patch.github_handle.is_none());
        assert!(patch.github_stats.is_none());
    }

    #[test]
    fn repository_stats_blob_shape() {
        let p = payload(&[("frontend", 1.0)], &["React", "Next.js"]);
        let blob = repository_stats(&repo_summary(), &p);
        assert_eq!(blob["languages"]["TypeScript"], 2);
        assert_eq!(blob["frameworks"][0], "React");
        assert_eq!(blob["top_repos"][0], "webapp");
    }

    #[test]
    fn submission_stats_blob_shape() {
        let summary = SubmissionSummary {
            topics: [(
                "Array".to_string(),
                crate::normalize::TopicStat {
                    solved: 40,
                    slug: "array".to_string(),
                },
            )]
            .into_iter()
            .collect(),
            total_solved: 120,
            ranking: 45210,
            solved_by_difficulty: [("Easy".to_string(), 60)].into_iter().collect(),
        };
        let blob = submission_stats(&summary);
        assert_eq!(blob["topics"]["Array"]["solved"], 40);
        assert_eq!(blob["total_solved"], 120);
        assert_eq!(blob["ranking"], 45210);
        assert_eq!(blob["solved_by_difficulty"]["Easy"], 60);
    }
}
