//! Editorial decisions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{DecisionId, ManuscriptId, UserId};
use crate::manuscript::ManuscriptStatus;

/// Kind of editorial decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
    Accept,
    MinorRevision,
    MajorRevision,
    Reject,
}

impl DecisionKind {
    /// Status the manuscript moves to
    pub fn resulting_status(&self) -> ManuscriptStatus {
        match self {
            DecisionKind::Accept => ManuscriptStatus::Accepted,
            DecisionKind::MinorRevision | DecisionKind::MajorRevision => {
                ManuscriptStatus::RevisionRequested
            }
            DecisionKind::Reject => ManuscriptStatus::Rejected,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionKind::Accept => "accept",
            DecisionKind::MinorRevision => "minor_revision",
            DecisionKind::MajorRevision => "major_revision",
            DecisionKind::Reject => "reject",
        }
    }
}

impl std::fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recorded editorial decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub id: DecisionId,
    pub manuscript_id: ManuscriptId,
    pub editor_id: UserId,
    pub kind: DecisionKind,
    pub comments: String,
    /// Status the decision moved the manuscript from
    pub from_status: ManuscriptStatus,
    /// Status the decision moved the manuscript to
    pub resulting_status: ManuscriptStatus,
    pub decided_at: DateTime<Utc>,
}
