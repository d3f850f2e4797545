//! Prompt builders for the scoring oracle.
//!
//! Each prompt embeds the evidence summary as JSON plus a strict
//! instruction to emit exactly one JSON object with the schema's fields.
//! The oracle's compliance is never assumed; the validator checks it.

use crate::handle::Handle;
use crate::normalize::{RepoSummary, SubmissionSummary};

/// Prompt for the repository source: frontend/backend/dsa scores plus
/// detected frameworks.
pub fn build_repository_prompt(handle: &Handle, summary: &RepoSummary) -> String {
    let languages = serde_json::to_string(&summary.languages).unwrap_or_default();
    let repos = serde_json::to_string_pretty(&summary.repos).unwrap_or_default();

    format!(
        "Analyze the following public repositories owned by \"{handle}\".\n\
         Language histogram (language -> repository count): {languages}\n\
         Repositories: {repos}\n\
         \n\
         Based on the repository names, descriptions, topics and languages,\n\
         perform two tasks:\n\
         1. Provide skill scores from 0 to 100 for \"frontend\", \"backend\", and \"dsa\".\n\
         2. Identify the top 5 \"frameworks\" or libraries in use\n\
            (e.g., React, Next.js, Django, PyTorch, Node.js).\n\
         \n\
         Output strictly one JSON object in this exact format and nothing else:\n\
         {{\n\
           \"frontend\": number,\n\
           \"backend\": number,\n\
           \"dsa\": number,\n\
           \"frameworks\": string[],\n\
           \"reasoning\": \"string\"\n\
         }}"
    )
}

/// Prompt for the submission source: a single competitive DSA score.
pub fn build_submission_prompt(handle: &Handle, summary: &SubmissionSummary) -> String {
    let topics = serde_json::to_string(&summary.topics).unwrap_or_default();
    let difficulty = serde_json::to_string(&summary.solved_by_difficulty).unwrap_or_default();

    format!(
        "Analyze the following solved-problem distribution for user \"{handle}\"\n\
         and provide a competitive DSA score from 0 to 100.\n\
         - Total solved: {total}\n\
         - Global ranking: {ranking}\n\
         - Solved by difficulty: {difficulty}\n\
         - Topic breakdown (topic -> solved count): {topics}\n\
         \n\
         Output strictly one JSON object in this exact format and nothing else:\n\
         {{ \"dsa\": number, \"reasoning\": \"string\" }}",
        total = summary.total_solved,
        ranking = summary.ranking,
    )
}
