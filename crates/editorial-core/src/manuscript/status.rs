//! Manuscript status state machine
//!
//! ```text
//! submitted → technical_check → under_review ⇄ revision_requested
//!     │              │               │   │            │
//!     └──────────────┴───────────────┘   └→ accepted ←┘
//!                    │               │         │
//!                    └──→ rejected ←─┘      published
//! ```
//!
//! `published` and `rejected` are terminal. Which edge a trigger may take
//! is decided by [`Trigger::destination`].

use serde::{Deserialize, Serialize};

use crate::decision::DecisionKind;
use crate::error::{EditorialError, Result};

/// Canonical status of a manuscript
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManuscriptStatus {
    /// Received, not yet screened
    Submitted,
    /// In (or through) the desk check, waiting for reviewers
    TechnicalCheck,
    /// Out with reviewers
    UnderReview,
    /// Waiting for the author's revision
    RevisionRequested,
    /// Accepted, waiting for an issue
    Accepted,
    /// Published in an issue
    Published,
    /// Rejected
    Rejected,
}

impl ManuscriptStatus {
    /// Check if a status edge exists in the graph
    pub fn can_transition_to(&self, target: &ManuscriptStatus) -> bool {
        use ManuscriptStatus::*;
        match (self, target) {
            (Submitted, TechnicalCheck) => true,
            (Submitted, UnderReview) => true,

            (TechnicalCheck, UnderReview) => true,
            (TechnicalCheck, Rejected) => true,

            (UnderReview, RevisionRequested) => true,
            (UnderReview, Accepted) => true,
            (UnderReview, Rejected) => true,

            (RevisionRequested, UnderReview) => true,
            (RevisionRequested, TechnicalCheck) => true,
            (RevisionRequested, Accepted) => true,
            (RevisionRequested, Rejected) => true,

            (Accepted, Published) => true,

            // Published and Rejected are terminal
            (Published, _) => false,
            (Rejected, _) => false,

            _ => false,
        }
    }

    /// Check if the manuscript is in a terminal status
    pub fn is_terminal(&self) -> bool {
        matches!(self, ManuscriptStatus::Published | ManuscriptStatus::Rejected)
    }

    /// Whether reviewers may still be invited
    pub fn accepts_reviewers(&self) -> bool {
        matches!(
            self,
            ManuscriptStatus::Submitted
                | ManuscriptStatus::TechnicalCheck
                | ManuscriptStatus::UnderReview
                | ManuscriptStatus::RevisionRequested
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ManuscriptStatus::Submitted => "submitted",
            ManuscriptStatus::TechnicalCheck => "technical_check",
            ManuscriptStatus::UnderReview => "under_review",
            ManuscriptStatus::RevisionRequested => "revision_requested",
            ManuscriptStatus::Accepted => "accepted",
            ManuscriptStatus::Published => "published",
            ManuscriptStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        use ManuscriptStatus::*;
        [
            Submitted,
            TechnicalCheck,
            UnderReview,
            RevisionRequested,
            Accepted,
            Published,
            Rejected,
        ]
        .into_iter()
        .find(|status| status.as_str() == s)
    }

    /// Get a human-readable description of the status
    pub fn description(&self) -> &'static str {
        match self {
            ManuscriptStatus::Submitted => "Received, awaiting technical check",
            ManuscriptStatus::TechnicalCheck => "Technical check, awaiting reviewers",
            ManuscriptStatus::UnderReview => "Under peer review",
            ManuscriptStatus::RevisionRequested => "Waiting for the author's revision",
            ManuscriptStatus::Accepted => "Accepted for publication",
            ManuscriptStatus::Published => "Published",
            ManuscriptStatus::Rejected => "Rejected",
        }
    }
}

impl std::fmt::Display for ManuscriptStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something that moves a manuscript through the workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Desk check passed; `reviewers_assigned` picks the branch
    PassTechnicalCheck { reviewers_assigned: bool },
    AssignReviewer,
    Decide(DecisionKind),
    /// Revision received; the destination comes from the re-review policy
    SubmitRevision { re_review: ManuscriptStatus },
    PublishIssue,
}

impl Trigger {
    /// Source statuses this trigger may fire from
    pub fn allowed_from(&self) -> &'static [ManuscriptStatus] {
        use ManuscriptStatus::*;
        match self {
            Trigger::PassTechnicalCheck { .. } => &[Submitted, TechnicalCheck],
            Trigger::AssignReviewer => &[Submitted, TechnicalCheck],
            Trigger::Decide(DecisionKind::Accept) => &[UnderReview, RevisionRequested],
            Trigger::Decide(DecisionKind::MinorRevision | DecisionKind::MajorRevision) => {
                &[UnderReview]
            }
            Trigger::Decide(DecisionKind::Reject) => &[TechnicalCheck, UnderReview, RevisionRequested],
            Trigger::SubmitRevision { .. } => &[RevisionRequested],
            Trigger::PublishIssue => &[Accepted],
        }
    }

    /// Compute the destination from `from`, or fail with `InvalidTransition`
    pub fn destination(&self, from: ManuscriptStatus) -> Result<ManuscriptStatus> {
        if !self.allowed_from().contains(&from) {
            return Err(EditorialError::InvalidTransition {
                from,
                trigger: self.name().to_string(),
            });
        }

        let to = match self {
            Trigger::PassTechnicalCheck { reviewers_assigned } => {
                if *reviewers_assigned {
                    ManuscriptStatus::UnderReview
                } else {
                    ManuscriptStatus::TechnicalCheck
                }
            }
            Trigger::AssignReviewer => ManuscriptStatus::UnderReview,
            Trigger::Decide(kind) => kind.resulting_status(),
            Trigger::SubmitRevision { re_review } => *re_review,
            Trigger::PublishIssue => ManuscriptStatus::Published,
        };

        // Re-running the desk check leaves a technical_check manuscript where it is
        if to != from && !from.can_transition_to(&to) {
            return Err(EditorialError::InvalidTransition {
                from,
                trigger: self.name().to_string(),
            });
        }

        Ok(to)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Trigger::PassTechnicalCheck { .. } => "pass technical check",
            Trigger::AssignReviewer => "assign reviewer",
            Trigger::Decide(DecisionKind::Accept) => "accept",
            Trigger::Decide(DecisionKind::MinorRevision) => "request minor revision",
            Trigger::Decide(DecisionKind::MajorRevision) => "request major revision",
            Trigger::Decide(DecisionKind::Reject) => "reject",
            Trigger::SubmitRevision { .. } => "submit revision",
            Trigger::PublishIssue => "publish",
        }
    }
}
