//! Oracle output validation: untrusted text -> checked score payload.
//!
//! Oracle responses are free text that usually, but not reliably, contains
//! one JSON object. Validation locates the first balanced object, parses
//! it, and checks every schema field for presence, type, and range. An
//! out-of-range score is rejected, never clamped: a silently clamped value
//! is indistinguishable from a legitimately extreme one and would corrupt
//! the profile.

use std::collections::BTreeMap;

use profile_state::SourceId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Inclusive score bounds.
pub const SCORE_MIN: f64 = 0.0;
pub const SCORE_MAX: f64 = 100.0;

/// Declared shape of an oracle response for one evidence source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSchema {
    pub source: SourceId,
    /// Numeric fields, each required and bounded to [0,100].
    pub score_fields: &'static [&'static str],
    /// String-array fields, each required.
    pub list_fields: &'static [&'static str],
    /// Free-text fields, each required.
    pub text_fields: &'static [&'static str],
}

impl OutputSchema {
    /// Schema for the repository source.
    pub fn repository() -> Self {
        OutputSchema {
            source: SourceId::Repositories,
            score_fields: &["frontend", "backend", "dsa"],
            list_fields: &["frameworks"],
            text_fields: &["reasoning"],
        }
    }

    /// Schema for the submission source.
    pub fn submission() -> Self {
        OutputSchema {
            source: SourceId::Submissions,
            score_fields: &["dsa"],
            list_fields: &[],
            text_fields: &["reasoning"],
        }
    }

    /// Schema for a given source id.
    pub fn for_source(source: SourceId) -> Self {
        match source {
            SourceId::Repositories => Self::repository(),
            SourceId::Submissions => Self::submission(),
        }
    }
}

/// Validated oracle output. Built exclusively from schema fields; anything
/// extra in the oracle's object is dropped here and never reaches the
/// profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorePayload {
    pub scores: BTreeMap<String, f64>,
    pub lists: BTreeMap<String, Vec<String>>,
    pub rationale: String,
}

impl ScorePayload {
    /// The validated value of one score field. Validation guarantees every
    /// schema score field is present, so a `None` here means the caller
    /// asked for a field outside the schema.
    pub fn score(&self, field: &str) -> Option<f64> {
        self.scores.get(field).copied()
    }
}

/// Errors from oracle output validation. All are terminal for the attempt;
/// the orchestrator may re-prompt a bounded number of times.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// No balanced JSON object anywhere in the response, or the balanced
    /// region did not parse as JSON.
    #[error("no structured payload found in oracle response")]
    NoStructuredPayload,

    /// A schema-required field is absent.
    #[error("oracle response is missing required field {field:?}")]
    MissingField { field: String },

    /// A field is present with the wrong JSON type.
    #[error("oracle field {field:?} has the wrong type (expected {expected})")]
    TypeMismatch {
        field: String,
        expected: &'static str,
    },

    /// A score field is outside [0,100].
    #[error("oracle field {field:?} value {value} is outside [0,100]")]
    OutOfRange { field: String, value: f64 },
}

/// Locate the first balanced `{…}` region in `raw`.
///
/// The scan is string- and escape-aware so braces inside JSON string
/// literals (including the rationale text) do not unbalance it. Returns
/// `None` when no balanced object exists.
pub fn extract_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in raw[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&raw[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Validate raw oracle text against `schema`.
pub fn validate(raw: &str, schema: &OutputSchema) -> Result<ScorePayload, ValidationError> {
    let region = extract_object(raw).ok_or(ValidationError::NoStructuredPayload)?;
    let object: Value =
        serde_json::from_str(region).map_err(|_| ValidationError::NoStructuredPayload)?;
    let map = object
        .as_object()
        .ok_or(ValidationError::NoStructuredPayload)?;

    let mut scores = BTreeMap::new();
    for &field in schema.score_fields {
        let value = map.get(field).ok_or_else(|| ValidationError::MissingField {
            field: field.to_string(),
        })?;
        let number = value.as_f64().ok_or_else(|| ValidationError::TypeMismatch {
            field: field.to_string(),
            expected: "number",
        })?;
        if !(SCORE_MIN..=SCORE_MAX).contains(&number) {
            return Err(ValidationError::OutOfRange {
                field: field.to_string(),
                value: number,
            });
        }
        scores.insert(field.to_string(), number);
    }

    let mut lists = BTreeMap::new();
    for &field in schema.list_fields {
        let value = map.get(field).ok_or_else(|| ValidationError::MissingField {
            field: field.to_string(),
        })?;
        let items = value.as_array().ok_or_else(|| ValidationError::TypeMismatch {
            field: field.to_string(),
            expected: "array of strings",
        })?;
        let mut strings = Vec::with_capacity(items.len());
        for item in items {
            let s = item.as_str().ok_or_else(|| ValidationError::TypeMismatch {
                field: field.to_string(),
                expected: "array of strings",
            })?;
            strings.push(s.to_string());
        }
        lists.insert(field.to_string(), strings);
    }

    let mut rationale = String::new();
    for &field in schema.text_fields {
        let value = map.get(field).ok_or_else(|| ValidationError::MissingField {
            field: field.to_string(),
        })?;
        let text = value.as_str().ok_or_else(|| ValidationError::TypeMismatch {
            field: field.to_string(),
            expected: "string",
        })?;
        rationale = text.to_string();
    }

    Ok(ScorePayload {
        scores,
        lists,
        rationale,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD_REPO: &str = r#"Here is my assessment:
        {"frontend": 80, "backend": 40, "dsa": 55,
         "frameworks": ["React"], "reasoning": "Mostly TypeScript UIs."}
        Let me know if you need anything else."#;

    #[test]
    fn extracts_object_surrounded_by_prose() {
        let region = extract_object(GOOD_REPO).unwrap();
        assert!(region.starts_with('{') && region.ends_with('}'));
        let value: Value = serde_json::from_str(region).unwrap();
        assert_eq!(value["frontend"], 80);
    }

    #[test]
    fn extraction_ignores_braces_inside_strings() {
        let raw = r#"{"reasoning": "uses {braces} and a \" quote", "dsa": 10}"#;
        let region = extract_object(raw).unwrap();
        assert_eq!(region, raw);
    }

    #[test]
    fn extraction_handles_nested_objects() {
        let raw = r#"prefix {"a": {"b": 1}, "c": 2} suffix {"d": 3}"#;
        assert_eq!(extract_object(raw), Some(r#"{"a": {"b": 1}, "c": 2}"#));
    }

    #[test]
    fn no_object_at_all() {
        assert_eq!(extract_object("the model refused to answer"), None);
        assert_eq!(extract_object("unbalanced { forever"), None);
    }

    #[test]
    fn validates_full_repository_payload() {
        let payload = validate(GOOD_REPO, &OutputSchema::repository()).unwrap();
        assert_eq!(payload.score("frontend"), Some(80.0));
        assert_eq!(payload.score("backend"), Some(40.0));
        assert_eq!(payload.score("dsa"), Some(55.0));
        assert_eq!(payload.lists["frameworks"], vec!["React"]);
        assert_eq!(payload.rationale, "Mostly TypeScript UIs.");
    }

    #[test]
    fn missing_field_is_rejected() {
        let raw = r#"{"frontend": 80, "dsa": 55, "frameworks": [], "reasoning": "x"}"#;
        let err = validate(raw, &OutputSchema::repository()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingField {
                field: "backend".into()
            }
        );
    }

    #[test]
    fn out_of_range_is_rejected_not_clamped() {
        let raw = r#"{"frontend": 150, "backend": 40, "dsa": 55,
                      "frameworks": [], "reasoning": "x"}"#;
        let err = validate(raw, &OutputSchema::repository()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::OutOfRange {
                field: "frontend".into(),
                value: 150.0
            }
        );

        let raw = r#"{"dsa": -1, "reasoning": "x"}"#;
        let err = validate(raw, &OutputSchema::submission()).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { .. }));
    }

    #[test]
    fn boundary_values_are_accepted() {
        let raw = r#"{"dsa": 0, "reasoning": "floor"}"#;
        assert_eq!(
            validate(raw, &OutputSchema::submission()).unwrap().score("dsa"),
            Some(0.0)
        );
        let raw = r#"{"dsa": 100, "reasoning": "ceiling"}"#;
        assert_eq!(
            validate(raw, &OutputSchema::submission()).unwrap().score("dsa"),
            Some(100.0)
        );
    }

    #[test]
    fn wrong_types_are_rejected() {
        let raw = r#"{"dsa": "seventy", "reasoning": "x"}"#;
        let err = validate(raw, &OutputSchema::submission()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::TypeMismatch {
                field: "dsa".into(),
                expected: "number"
            }
        );

        let raw = r#"{"frontend": 1, "backend": 2, "dsa": 3,
                      "frameworks": [42], "reasoning": "x"}"#;
        let err = validate(raw, &OutputSchema::repository()).unwrap_err();
        assert!(matches!(err, ValidationError::TypeMismatch { field, .. } if field == "frameworks"));

        let raw = r#"{"dsa": 50, "reasoning": null}"#;
        let err = validate(raw, &OutputSchema::submission()).unwrap_err();
        assert!(matches!(err, ValidationError::TypeMismatch { field, .. } if field == "reasoning"));
    }

    #[test]
    fn unparseable_balanced_region_is_no_structured_payload() {
        let raw = "{not json at all}";
        let err = validate(raw, &OutputSchema::submission()).unwrap_err();
        assert_eq!(err, ValidationError::NoStructuredPayload);
    }

    #[test]
    fn extra_oracle_fields_are_dropped() {
        let raw = r#"{"dsa": 70, "reasoning": "x", "confidence": 0.9, "model_notes": "hi"}"#;
        let payload = validate(raw, &OutputSchema::submission()).unwrap();
        assert_eq!(payload.scores.len(), 1);
        assert!(payload.lists.is_empty());
    }

    #[test]
    fn fractional_scores_are_legal() {
        let raw = r#"{"dsa": 66.5, "reasoning": "x"}"#;
        let payload = validate(raw, &OutputSchema::submission()).unwrap();
        assert_eq!(payload.score("dsa"), Some(66.5));
    }
}
