//! Configuration for editorial-core
//!
//! Centralized configuration for submission limits, the review window,
//! capacity policy and the re-review policy after a revision.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::manuscript::ManuscriptStatus;

/// Engine-wide configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorialConfig {
    /// Article submission limits
    pub submission: SubmissionConfig,
    /// Review window and scoring
    pub review: ReviewConfig,
    /// Concurrent assignment limits
    pub capacity: CapacityConfig,
    /// Revision cycle settings
    pub revision: RevisionConfig,
    /// Per-manuscript lock settings
    pub locking: LockConfig,
}

/// Limits checked by `submit_article`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmissionConfig {
    pub title_min_chars: usize,
    pub title_max_chars: usize,
    pub abstract_min_chars: usize,
    pub abstract_max_chars: usize,
    pub keywords_min: usize,
    pub keywords_max: usize,
    pub recommended_reviewers_min: usize,
    pub recommended_reviewers_max: usize,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            title_min_chars: 10,
            title_max_chars: 300,
            abstract_min_chars: 100,
            abstract_max_chars: 5000,
            keywords_min: 3,
            keywords_max: 10,
            recommended_reviewers_min: 3,
            recommended_reviewers_max: 10,
        }
    }
}

/// Review window and rating scale
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// Days between invitation and due date
    pub review_window_days: u32,
    /// Upper end of the rating scale (the lower end is 1)
    pub rating_scale_max: f64,
    /// Factors used to approximate sub-scores from an overall rating
    pub subscore_factors: SubscoreFactors,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            review_window_days: 21,
            rating_scale_max: 5.0,
            subscore_factors: SubscoreFactors::default(),
        }
    }
}

/// Display-time approximation of granular scores from one overall rating
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscoreFactors {
    pub technical_quality: f64,
    pub novelty: f64,
    pub clarity: f64,
    pub significance: f64,
}

impl Default for SubscoreFactors {
    fn default() -> Self {
        Self {
            technical_quality: 1.2,
            novelty: 1.1,
            clarity: 0.9,
            significance: 1.0,
        }
    }
}

/// Whether capacity limits block assignment or only warn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityPolicy {
    #[default]
    Enforce,
    Warn,
}

/// Concurrent assignment limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CapacityConfig {
    pub policy: CapacityPolicy,
    /// Default limit of active review assignments per reviewer
    pub max_active_reviews: u32,
    /// Default limit of manuscripts handled per associate editor
    pub max_active_editor_assignments: u32,
}

impl Default for CapacityConfig {
    fn default() -> Self {
        Self {
            policy: CapacityPolicy::Enforce,
            max_active_reviews: 5,
            max_active_editor_assignments: 20,
        }
    }
}

/// Where a manuscript goes after a revision is submitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReReviewPolicy {
    #[default]
    UnderReview,
    TechnicalCheck,
}

impl ReReviewPolicy {
    pub fn destination(&self) -> ManuscriptStatus {
        match self {
            ReReviewPolicy::UnderReview => ManuscriptStatus::UnderReview,
            ReReviewPolicy::TechnicalCheck => ManuscriptStatus::TechnicalCheck,
        }
    }
}

/// Revision cycle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RevisionConfig {
    pub re_review: ReReviewPolicy,
    /// Responses shorter than this produce a warning, not an error
    pub recommended_response_chars: usize,
}

impl Default for RevisionConfig {
    fn default() -> Self {
        Self {
            re_review: ReReviewPolicy::UnderReview,
            recommended_response_chars: 200,
        }
    }
}

/// Per-manuscript lock configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    /// How long an operation waits for a busy manuscript
    pub timeout_ms: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self { timeout_ms: 5000 }
    }
}

impl EditorialConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load configuration from a JSON string
    pub fn from_json(json_str: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json_str).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.submission;
        for (name, min, max) in [
            ("title", s.title_min_chars, s.title_max_chars),
            ("abstract", s.abstract_min_chars, s.abstract_max_chars),
            ("keywords", s.keywords_min, s.keywords_max),
            (
                "recommended_reviewers",
                s.recommended_reviewers_min,
                s.recommended_reviewers_max,
            ),
        ] {
            if min > max {
                return Err(ConfigError::InvalidBounds(format!(
                    "{} minimum {} exceeds maximum {}",
                    name, min, max
                )));
            }
        }

        if self.review.review_window_days == 0 {
            return Err(ConfigError::OutOfRange(
                "review_window_days must be positive".to_string(),
            ));
        }

        if self.review.rating_scale_max < 1.0 {
            return Err(ConfigError::OutOfRange(
                "rating_scale_max must be at least 1".to_string(),
            ));
        }

        if self.capacity.max_active_reviews == 0 || self.capacity.max_active_editor_assignments == 0
        {
            return Err(ConfigError::OutOfRange(
                "capacity limits must be positive".to_string(),
            ));
        }

        if self.locking.timeout_ms == 0 {
            return Err(ConfigError::OutOfRange(
                "lock timeout must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

/// Configuration error
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Minimum/maximum pairs are inverted
    #[error("Invalid bounds: {0}")]
    InvalidBounds(String),

    /// Value is out of valid range
    #[error("Value out of range: {0}")]
    OutOfRange(String),

    /// Text could not be parsed or rendered
    #[error("Parse error: {0}")]
    Parse(String),
}
