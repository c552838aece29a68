//! Revision validation and version allocation

use serde::{Deserialize, Serialize};

use super::{Revision, RevisionInput};
use crate::config::RevisionConfig;
use crate::error::FieldError;
use crate::manuscript::Manuscript;

/// Errors block a revision; warnings are advisory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<FieldError>,
    pub warnings: Vec<FieldError>,
}

/// Validates revisions and allocates version numbers
pub struct RevisionManager<'a> {
    config: &'a RevisionConfig,
}

impl<'a> RevisionManager<'a> {
    pub fn new(config: &'a RevisionConfig) -> Self {
        Self { config }
    }

    /// Check a revision against the manuscript it revises
    pub fn validate(&self, manuscript: &Manuscript, input: &RevisionInput) -> ValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if input.manuscript_id != manuscript.id {
            errors.push(FieldError::new(
                "manuscript_id",
                "does not match the manuscript being revised",
            ));
        }

        let response_len = input.response_to_reviewers.trim().chars().count();
        if response_len == 0 {
            errors.push(FieldError::new("response_to_reviewers", "is required"));
        } else if response_len < self.config.recommended_response_chars {
            warnings.push(FieldError::new(
                "response_to_reviewers",
                format!(
                    "is shorter than the recommended {} characters",
                    self.config.recommended_response_chars
                ),
            ));
        }

        if input.files.is_empty() {
            errors.push(FieldError::new("files", "at least one file is required"));
        }
        for (i, file) in input.files.iter().enumerate() {
            if file.name.trim().is_empty() {
                errors.push(FieldError::new(format!("files[{}]", i), "name is required"));
            } else if file.size_bytes == 0 {
                warnings.push(FieldError::new(format!("files[{}]", i), "file is empty"));
            }
        }

        let expected = manuscript.version + 1;
        if let Some(claimed) = input.expected_version {
            if claimed != expected {
                errors.push(FieldError::new(
                    "expected_version",
                    format!("next version is {}, not {}", expected, claimed),
                ));
            }
        }

        ValidationResult {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    /// Next version number, one past everything recorded so far
    pub fn next_version(manuscript: &Manuscript, history: &[Revision]) -> u32 {
        let stored = history.iter().map(|r| r.version).max().unwrap_or(0);
        manuscript.version.max(stored) + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::UserId;
    use crate::manuscript::{ArticleSubmission, ManuscriptFile};

    fn manuscript() -> Manuscript {
        Manuscript::from_submission(UserId::from("author-1"), ArticleSubmission::sample_valid())
    }

    fn input(manuscript: &Manuscript, response: &str) -> RevisionInput {
        RevisionInput {
            manuscript_id: manuscript.id,
            response_to_reviewers: response.to_string(),
            change_summary: None,
            files: vec![ManuscriptFile {
                name: "main-v2.pdf".to_string(),
                kind: "manuscript".to_string(),
                size_bytes: 130_000,
            }],
            expected_version: None,
        }
    }

    #[test]
    fn test_valid_with_short_response_warning() {
        let config = RevisionConfig::default();
        let m = manuscript();
        let result = RevisionManager::new(&config).validate(&m, &input(&m, "Fixed typos."));
        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].field, "response_to_reviewers");
    }

    #[test]
    fn test_missing_response_and_files_are_errors() {
        let config = RevisionConfig::default();
        let m = manuscript();
        let mut rev = input(&m, "   ");
        rev.files.clear();
        let result = RevisionManager::new(&config).validate(&m, &rev);
        assert!(!result.is_valid);
        let fields: Vec<_> = result.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["response_to_reviewers", "files"]);
    }

    #[test]
    fn test_version_continuity() {
        let config = RevisionConfig::default();
        let m = manuscript();
        let mut rev = input(&m, &"x".repeat(250));
        rev.expected_version = Some(3);
        let result = RevisionManager::new(&config).validate(&m, &rev);
        assert!(!result.is_valid);
        assert_eq!(result.errors[0].field, "expected_version");

        rev.expected_version = Some(2);
        let result = RevisionManager::new(&config).validate(&m, &rev);
        assert!(result.is_valid);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_next_version_skips_past_stored_history() {
        let m = manuscript();
        let history = vec![Revision::initial(&m)];
        assert_eq!(RevisionManager::next_version(&m, &history), 2);
        assert_eq!(RevisionManager::next_version(&m, &[]), 2);
    }
}
