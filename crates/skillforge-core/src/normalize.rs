//! Evidence normalization: raw records -> bounded, prompt-ready summaries.
//!
//! Pure functions, no I/O. Output size is capped independent of input size
//! so oracle prompt cost stays predictable regardless of how prolific the
//! analyzed account is.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::evidence::{RepoRecord, SubmissionActivity};

/// Languages kept in the histogram, highest repository count first.
pub const MAX_LANGUAGES: usize = 12;
/// Repository descriptors embedded in the prompt.
pub const MAX_REPO_DESCRIPTORS: usize = 25;
/// Repository names surfaced in the stats blob.
pub const MAX_TOP_REPOS: usize = 5;
/// Topic tags kept in the summary, highest solved count first.
pub const MAX_TOPICS: usize = 24;

/// Prompt-facing slice of one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoDescriptor {
    pub name: String,
    pub description: Option<String>,
    pub language: Option<String>,
    pub topics: Vec<String>,
}

/// Bounded aggregate of repository evidence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoSummary {
    /// Language -> repository count, at most [`MAX_LANGUAGES`] entries.
    /// Repositories with no declared language are omitted entirely.
    pub languages: BTreeMap<String, u32>,
    pub repos: Vec<RepoDescriptor>,
    /// Names of the most recently updated repositories, for the stats blob.
    pub top_repo_names: Vec<String>,
}

/// Per-topic solved count in a submission summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicStat {
    pub solved: u32,
    pub slug: String,
}

/// Bounded aggregate of submission evidence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionSummary {
    /// Topic name -> stats, at most [`MAX_TOPICS`] entries.
    pub topics: BTreeMap<String, TopicStat>,
    pub total_solved: u32,
    pub ranking: u64,
    pub solved_by_difficulty: BTreeMap<String, u32>,
}

/// Reduce fetched repositories into a bounded summary.
///
/// Input order (newest first) is preserved for descriptors and top names;
/// the language histogram keeps the most common [`MAX_LANGUAGES`] languages.
pub fn normalize_repos(records: &[RepoRecord]) -> RepoSummary {
    let mut counts: BTreeMap<String, u32> = BTreeMap::new();
    for record in records {
        if let Some(language) = &record.language {
            *counts.entry(language.clone()).or_insert(0) += 1;
        }
    }

    let languages = if counts.len() > MAX_LANGUAGES {
        let mut ranked: Vec<(String, u32)> = counts.into_iter().collect();
        // BTreeMap iteration gives a stable name order, so ties break
        // alphabetically after the sort by count.
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(MAX_LANGUAGES);
        ranked.into_iter().collect()
    } else {
        counts
    };

    let repos = records
        .iter()
        .take(MAX_REPO_DESCRIPTORS)
        .map(|r| RepoDescriptor {
            name: r.name.clone(),
            description: r.description.clone(),
            language: r.language.clone(),
            topics: r.topics.clone(),
        })
        .collect();

    let top_repo_names = records
        .iter()
        .take(MAX_TOP_REPOS)
        .map(|r| r.name.clone())
        .collect();

    RepoSummary {
        languages,
        repos,
        top_repo_names,
    }
}

/// Reduce submission activity into a bounded summary.
pub fn normalize_submissions(activity: &SubmissionActivity) -> SubmissionSummary {
    let mut ranked: Vec<_> = activity.topics.iter().collect();
    ranked.sort_by(|a, b| {
        b.problems_solved
            .cmp(&a.problems_solved)
            .then_with(|| a.tag_name.cmp(&b.tag_name))
    });

    let topics = ranked
        .into_iter()
        .take(MAX_TOPICS)
        .map(|t| {
            (
                t.tag_name.clone(),
                TopicStat {
                    solved: t.problems_solved,
                    slug: t.tag_slug.clone(),
                },
            )
        })
        .collect();

    let solved_by_difficulty = activity
        .solved_by_difficulty
        .iter()
        .cloned()
        .collect();

    SubmissionSummary {
        topics,
        total_solved: activity.total_solved,
        ranking: activity.ranking,
        solved_by_difficulty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::TopicRecord;

    fn repo(name: &str, language: Option<&str>) -> RepoRecord {
        RepoRecord {
            name: name.to_string(),
            description: None,
            language: language.map(str::to_string),
            topics: vec![],
        }
    }

    #[test]
    fn counts_languages_and_omits_undeclared() {
        let records = vec![
            repo("web", Some("TypeScript")),
            repo("app", Some("TypeScript")),
            repo("etl", Some("Python")),
            repo("dotfiles", None),
        ];
        let summary = normalize_repos(&records);
        assert_eq!(summary.languages.get("TypeScript"), Some(&2));
        assert_eq!(summary.languages.get("Python"), Some(&1));
        assert_eq!(summary.languages.len(), 2, "no bucket for missing language");
    }

    #[test]
    fn language_histogram_is_capped_by_count() {
        let mut records = Vec::new();
        for i in 0..20 {
            // language L0 appears 20 times, L1 19 times, ...
            for j in i..20 {
                records.push(repo(&format!("r{i}-{j}"), Some(&format!("L{i:02}"))));
            }
        }
        let summary = normalize_repos(&records);
        assert_eq!(summary.languages.len(), MAX_LANGUAGES);
        assert!(summary.languages.contains_key("L00"));
        assert!(!summary.languages.contains_key("L19"));
    }

    #[test]
    fn preserves_input_order_for_descriptors_and_top_names() {
        let records = vec![
            repo("newest", Some("Rust")),
            repo("older", Some("Go")),
            repo("oldest", None),
        ];
        let summary = normalize_repos(&records);
        assert_eq!(summary.top_repo_names, vec!["newest", "older", "oldest"]);
        assert_eq!(summary.repos[0].name, "newest");
    }

    #[test]
    fn descriptor_list_is_capped() {
        let records: Vec<_> = (0..80).map(|i| repo(&format!("r{i}"), None)).collect();
        let summary = normalize_repos(&records);
        assert_eq!(summary.repos.len(), MAX_REPO_DESCRIPTORS);
        assert_eq!(summary.top_repo_names.len(), MAX_TOP_REPOS);
    }

    #[test]
    fn normalization_is_deterministic() {
        let records = vec![repo("a", Some("Rust")), repo("b", Some("Go"))];
        assert_eq!(normalize_repos(&records), normalize_repos(&records));
    }

    fn topic(name: &str, solved: u32) -> TopicRecord {
        TopicRecord {
            tag_name: name.to_string(),
            tag_slug: name.to_lowercase().replace(' ', "-"),
            problems_solved: solved,
        }
    }

    #[test]
    fn submission_topics_capped_by_solved_count() {
        let topics: Vec<_> = (0..40).map(|i| topic(&format!("Topic {i:02}"), i)).collect();
        let activity = SubmissionActivity {
            topics,
            total_solved: 500,
            ranking: 1000,
            solved_by_difficulty: vec![("Easy".into(), 300), ("Medium".into(), 200)],
        };
        let summary = normalize_submissions(&activity);
        assert_eq!(summary.topics.len(), MAX_TOPICS);
        // Highest solved counts survive the cap.
        assert!(summary.topics.contains_key("Topic 39"));
        assert!(!summary.topics.contains_key("Topic 00"));
        assert_eq!(summary.total_solved, 500);
        assert_eq!(summary.solved_by_difficulty.get("Easy"), Some(&300));
    }

    #[test]
    fn submission_summary_keeps_slugs() {
        let activity = SubmissionActivity {
            topics: vec![topic("Hash Table", 25)],
            total_solved: 25,
            ranking: 77,
            solved_by_difficulty: vec![],
        };
        let summary = normalize_submissions(&activity);
        assert_eq!(summary.topics["Hash Table"].slug, "hash-table");
    }
}
