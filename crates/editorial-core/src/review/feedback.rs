//! Reviewer feedback

use serde::{Deserialize, Serialize};

use crate::config::SubscoreFactors;
use crate::error::FieldError;

/// A reviewer's recommendation to the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Accept,
    MinorRevision,
    MajorRevision,
    Reject,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::Accept => "accept",
            Recommendation::MinorRevision => "minor_revision",
            Recommendation::MajorRevision => "major_revision",
            Recommendation::Reject => "reject",
        }
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Granular quality scores
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubScores {
    pub technical_quality: f64,
    pub novelty: f64,
    pub clarity: f64,
    pub significance: f64,
}

impl SubScores {
    /// Approximate sub-scores from a single overall rating.
    ///
    /// This is a display-time approximation: each score is the rating times
    /// a fixed factor, clamped to `scale_max`. It is not a measurement.
    pub fn derived(rating: f64, factors: &SubscoreFactors, scale_max: f64) -> Self {
        let scale = |factor: f64| (rating * factor).min(scale_max);
        Self {
            technical_quality: scale(factors.technical_quality),
            novelty: scale(factors.novelty),
            clarity: scale(factors.clarity),
            significance: scale(factors.significance),
        }
    }

    fn values(&self) -> [(&'static str, f64); 4] {
        [
            ("scores.technical_quality", self.technical_quality),
            ("scores.novelty", self.novelty),
            ("scores.clarity", self.clarity),
            ("scores.significance", self.significance),
        ]
    }
}

/// What a reviewer submits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewFeedback {
    pub recommendation: Recommendation,
    /// Overall rating on the 1..=scale_max scale
    pub rating: f64,
    /// Granular scores, when the reviewer gave them
    #[serde(default)]
    pub scores: Option<SubScores>,
    pub comments_to_author: String,
    /// Only visible to editors
    #[serde(default)]
    pub confidential_comments: Option<String>,
}

impl ReviewFeedback {
    /// Check ratings against the scale and require author-facing comments
    pub fn validate(&self, scale_max: f64) -> Vec<FieldError> {
        let mut errors = Vec::new();
        let in_scale = |v: f64| v.is_finite() && (1.0..=scale_max).contains(&v);

        if !in_scale(self.rating) {
            errors.push(FieldError::new(
                "rating",
                format!("must be between 1 and {}", scale_max),
            ));
        }

        if let Some(scores) = &self.scores {
            for (field, value) in scores.values() {
                if !in_scale(value) {
                    errors.push(FieldError::new(
                        field,
                        format!("must be between 1 and {}", scale_max),
                    ));
                }
            }
        }

        if self.comments_to_author.trim().is_empty() {
            errors.push(FieldError::new("comments_to_author", "is required"));
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feedback(rating: f64) -> ReviewFeedback {
        ReviewFeedback {
            recommendation: Recommendation::MinorRevision,
            rating,
            scores: None,
            comments_to_author: "Clarify the viscosity prior.".to_string(),
            confidential_comments: None,
        }
    }

    #[test]
    fn test_derived_scores_are_clamped() {
        let scores = SubScores::derived(5.0, &SubscoreFactors::default(), 5.0);
        assert_eq!(scores.technical_quality, 5.0);
        assert_eq!(scores.novelty, 5.0);
        assert!((scores.clarity - 4.5).abs() < 1e-9);
        assert_eq!(scores.significance, 5.0);
    }

    #[test]
    fn test_derived_scores_scale_linearly() {
        let scores = SubScores::derived(3.0, &SubscoreFactors::default(), 5.0);
        assert!((scores.technical_quality - 3.6).abs() < 1e-9);
        assert!((scores.novelty - 3.3).abs() < 1e-9);
        assert!((scores.clarity - 2.7).abs() < 1e-9);
        assert!((scores.significance - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_rating_outside_scale() {
        assert!(feedback(4.0).validate(5.0).is_empty());
        assert_eq!(feedback(0.5).validate(5.0)[0].field, "rating");
        assert_eq!(feedback(5.5).validate(5.0)[0].field, "rating");
        assert_eq!(feedback(f64::NAN).validate(5.0)[0].field, "rating");
    }

    #[test]
    fn test_sub_scores_checked() {
        let mut fb = feedback(4.0);
        fb.scores = Some(SubScores {
            technical_quality: 4.0,
            novelty: 9.0,
            clarity: 3.0,
            significance: 3.0,
        });
        fb.comments_to_author = "  ".to_string();
        let fields: Vec<_> = fb.validate(5.0).into_iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["scores.novelty", "comments_to_author"]);
    }
}
