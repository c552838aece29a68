//! Revision records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FieldError;
use crate::ids::{ManuscriptId, RevisionId, UserId};
use crate::manuscript::{Manuscript, ManuscriptFile, ManuscriptStatus};

/// What an author sends with a revised manuscript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionInput {
    pub manuscript_id: ManuscriptId,
    /// Point-by-point response to the reviewers
    #[serde(default)]
    pub response_to_reviewers: String,
    #[serde(default)]
    pub change_summary: Option<String>,
    #[serde(default)]
    pub files: Vec<ManuscriptFile>,
    /// Version the author believes they are submitting, if given
    #[serde(default)]
    pub expected_version: Option<u32>,
}

/// One version of a manuscript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    pub id: RevisionId,
    pub manuscript_id: ManuscriptId,
    /// 1 for the original submission, then 2, 3, ... without gaps
    pub version: u32,
    pub author_id: UserId,
    pub response_to_reviewers: String,
    pub change_summary: Option<String>,
    pub files: Vec<ManuscriptFile>,
    pub submitted_at: DateTime<Utc>,
}

impl Revision {
    /// Version 1, recorded from the original submission
    pub fn initial(manuscript: &Manuscript) -> Self {
        Self {
            id: RevisionId::new(),
            manuscript_id: manuscript.id,
            version: 1,
            author_id: manuscript.author_id.clone(),
            response_to_reviewers: String::new(),
            change_summary: None,
            files: manuscript.files.clone(),
            submitted_at: manuscript.submitted_at,
        }
    }

    pub fn from_input(author_id: UserId, version: u32, input: RevisionInput) -> Self {
        Self {
            id: RevisionId::new(),
            manuscript_id: input.manuscript_id,
            version,
            author_id,
            response_to_reviewers: input.response_to_reviewers.trim().to_string(),
            change_summary: input
                .change_summary
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            files: input.files,
            submitted_at: Utc::now(),
        }
    }
}

/// Returned by a successful revision submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionReceipt {
    pub revision_id: RevisionId,
    pub version: u32,
    /// Status the manuscript moved to
    pub status: ManuscriptStatus,
    pub message: String,
    /// Advisory findings that did not block the revision
    pub warnings: Vec<FieldError>,
}
