//! Manuscript struct and related types

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ArticleSubmission, ManuscriptStatus};
use crate::error::{EditorialError, Result};
use crate::ids::{ManuscriptId, UserId};

/// An author listed on the manuscript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contributor {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub affiliation: Option<String>,
    #[serde(default)]
    pub orcid: Option<String>,
    #[serde(default)]
    pub is_corresponding: bool,
}

/// A reviewer the author suggests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedReviewer {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub affiliation: Option<String>,
}

/// One entry in a file manifest; the bytes live in file storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManuscriptFile {
    pub name: String,
    /// e.g. "manuscript", "figure", "supplement", "response"
    pub kind: String,
    pub size_bytes: u64,
}

/// A manuscript under editorial management
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manuscript {
    pub id: ManuscriptId,
    pub title: String,
    pub abstract_text: String,
    pub category: String,
    pub keywords: BTreeSet<String>,
    /// Submitting (corresponding) author
    pub author_id: UserId,
    pub contributors: Vec<Contributor>,
    pub suggested_reviewers: Vec<SuggestedReviewer>,
    /// File manifest of the current version
    pub files: Vec<ManuscriptFile>,
    pub status: ManuscriptStatus,
    /// Current version number, 1 at submission
    pub version: u32,
    /// Active associate editor
    pub editor_id: Option<UserId>,
    /// Everyone ever invited to review, without duplicates
    pub reviewer_ids: BTreeSet<UserId>,
    pub technical_check_passed_at: Option<DateTime<Utc>>,
    /// Issue the manuscript was published in
    pub issue: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Manuscript {
    /// Create a freshly submitted manuscript from a validated submission
    pub fn from_submission(author_id: UserId, submission: ArticleSubmission) -> Self {
        let now = Utc::now();
        Self {
            id: ManuscriptId::new(),
            title: submission.title.trim().to_string(),
            abstract_text: submission.abstract_text.trim().to_string(),
            category: submission.category.trim().to_string(),
            keywords: submission.normalized_keywords(),
            author_id,
            contributors: submission.authors,
            suggested_reviewers: submission.recommended_reviewers,
            files: submission.files,
            status: ManuscriptStatus::Submitted,
            version: 1,
            editor_id: None,
            reviewer_ids: BTreeSet::new(),
            technical_check_passed_at: None,
            issue: None,
            published_at: None,
            submitted_at: now,
            updated_at: now,
        }
    }

    /// Move to a new status along an existing edge
    pub fn transition_to(&mut self, new_status: ManuscriptStatus) -> Result<()> {
        if new_status == self.status {
            self.touch();
            return Ok(());
        }
        if !self.status.can_transition_to(&new_status) {
            return Err(EditorialError::InvalidTransition {
                from: self.status,
                trigger: format!("move to {}", new_status),
            });
        }
        self.status = new_status;
        self.touch();
        Ok(())
    }

    /// Add a reviewer to the reviewer set; returns false if already present
    pub fn add_reviewer(&mut self, reviewer_id: UserId) -> bool {
        let inserted = self.reviewer_ids.insert(reviewer_id);
        if inserted {
            self.touch();
        }
        inserted
    }

    pub fn has_reviewers(&self) -> bool {
        !self.reviewer_ids.is_empty()
    }

    pub fn is_author(&self, user_id: &UserId) -> bool {
        &self.author_id == user_id
    }

    pub fn is_editor(&self, user_id: &UserId) -> bool {
        self.editor_id.as_ref() == Some(user_id)
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// The corresponding contributor, if listed
    pub fn corresponding_author(&self) -> Option<&Contributor> {
        self.contributors.iter().find(|c| c.is_corresponding)
    }
}
