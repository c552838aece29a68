//! Article submission payload and its validation

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{Contributor, ManuscriptFile, SuggestedReviewer};
use crate::config::SubmissionConfig;
use crate::error::FieldError;

/// What an author sends to submit a new article
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleSubmission {
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub category: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// All authors, including the submitting one
    #[serde(default)]
    pub authors: Vec<Contributor>,
    #[serde(default)]
    pub recommended_reviewers: Vec<SuggestedReviewer>,
    #[serde(default)]
    pub files: Vec<ManuscriptFile>,
}

impl ArticleSubmission {
    /// Keywords trimmed, lowercased and de-duplicated
    pub fn normalized_keywords(&self) -> BTreeSet<String> {
        self.keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect()
    }

    /// Check every limit; an empty result means the submission is valid
    pub fn validate(&self, limits: &SubmissionConfig) -> Vec<FieldError> {
        let mut errors = Vec::new();

        let title_len = self.title.trim().chars().count();
        if title_len < limits.title_min_chars || title_len > limits.title_max_chars {
            errors.push(FieldError::new(
                "title",
                format!(
                    "must be between {} and {} characters (got {})",
                    limits.title_min_chars, limits.title_max_chars, title_len
                ),
            ));
        }

        let abstract_len = self.abstract_text.trim().chars().count();
        if abstract_len < limits.abstract_min_chars || abstract_len > limits.abstract_max_chars {
            errors.push(FieldError::new(
                "abstract",
                format!(
                    "must be between {} and {} characters (got {})",
                    limits.abstract_min_chars, limits.abstract_max_chars, abstract_len
                ),
            ));
        }

        if self.category.trim().is_empty() {
            errors.push(FieldError::new("category", "is required"));
        }

        let keyword_count = self.normalized_keywords().len();
        if keyword_count < limits.keywords_min || keyword_count > limits.keywords_max {
            errors.push(FieldError::new(
                "keywords",
                format!(
                    "between {} and {} distinct keywords required (got {})",
                    limits.keywords_min, limits.keywords_max, keyword_count
                ),
            ));
        }

        let corresponding = self.authors.iter().filter(|a| a.is_corresponding).count();
        if corresponding != 1 {
            errors.push(FieldError::new(
                "authors",
                format!(
                    "exactly one corresponding author required (got {})",
                    corresponding
                ),
            ));
        }

        for (i, author) in self.authors.iter().enumerate() {
            if author.name.trim().is_empty() || author.email.trim().is_empty() {
                errors.push(FieldError::new(
                    format!("authors[{}]", i),
                    "name and email are required",
                ));
            }
        }

        let reviewers = self.recommended_reviewers.len();
        if reviewers < limits.recommended_reviewers_min
            || reviewers > limits.recommended_reviewers_max
        {
            errors.push(FieldError::new(
                "recommended_reviewers",
                format!(
                    "between {} and {} recommended reviewers required (got {})",
                    limits.recommended_reviewers_min, limits.recommended_reviewers_max, reviewers
                ),
            ));
        }

        errors
    }

    #[cfg(test)]
    pub(crate) fn sample_valid() -> Self {
        Self {
            title: "Tidal heating in close binary exoplanets".to_string(),
            abstract_text: "We model tidal dissipation in short-period planets orbiting \
                            low-mass stars and derive limits on interior viscosity from \
                            the observed eccentricity distribution."
                .to_string(),
            category: "Astrophysics".to_string(),
            keywords: vec![
                "tides".to_string(),
                "exoplanets".to_string(),
                "viscosity".to_string(),
            ],
            authors: vec![
                Contributor {
                    name: "Ana Author".to_string(),
                    email: "ana@uni.example".to_string(),
                    affiliation: Some("Uni".to_string()),
                    orcid: None,
                    is_corresponding: true,
                },
                Contributor {
                    name: "Cole Author".to_string(),
                    email: "cole@uni.example".to_string(),
                    affiliation: None,
                    orcid: None,
                    is_corresponding: false,
                },
            ],
            recommended_reviewers: (1..=3)
                .map(|i| SuggestedReviewer {
                    name: format!("Reviewer {}", i),
                    email: format!("r{}@inst.example", i),
                    affiliation: None,
                })
                .collect(),
            files: vec![ManuscriptFile {
                name: "main.pdf".to_string(),
                kind: "manuscript".to_string(),
                size_bytes: 120_000,
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(errors: &[FieldError]) -> Vec<&str> {
        errors.iter().map(|e| e.field.as_str()).collect()
    }

    #[test]
    fn test_valid_submission() {
        let sub = ArticleSubmission::sample_valid();
        assert!(sub.validate(&SubmissionConfig::default()).is_empty());
    }

    #[test]
    fn test_title_of_nine_chars_rejected() {
        let mut sub = ArticleSubmission::sample_valid();
        sub.title = "123456789".to_string();
        let errors = sub.validate(&SubmissionConfig::default());
        assert_eq!(fields(&errors), vec!["title"]);
    }

    #[test]
    fn test_duplicate_keywords_count_once() {
        let mut sub = ArticleSubmission::sample_valid();
        sub.keywords = vec!["Tides".into(), "tides ".into(), "orbits".into()];
        let errors = sub.validate(&SubmissionConfig::default());
        assert_eq!(fields(&errors), vec!["keywords"]);
    }

    #[test]
    fn test_two_corresponding_authors_rejected() {
        let mut sub = ArticleSubmission::sample_valid();
        sub.authors[1].is_corresponding = true;
        let errors = sub.validate(&SubmissionConfig::default());
        assert_eq!(fields(&errors), vec!["authors"]);
    }

    #[test]
    fn test_reviewer_bounds() {
        let mut sub = ArticleSubmission::sample_valid();
        sub.recommended_reviewers.truncate(2);
        let errors = sub.validate(&SubmissionConfig::default());
        assert_eq!(fields(&errors), vec!["recommended_reviewers"]);
    }

    #[test]
    fn test_collects_every_problem() {
        let mut sub = ArticleSubmission::sample_valid();
        sub.title = "short".into();
        sub.abstract_text = "tiny".into();
        sub.category = " ".into();
        let errors = sub.validate(&SubmissionConfig::default());
        assert_eq!(fields(&errors), vec!["title", "abstract", "category"]);
    }
}
