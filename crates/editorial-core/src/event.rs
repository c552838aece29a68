//! Domain events
//!
//! Every successful engine operation returns the events it produced. The
//! same events are appended to the manuscript's audit log in the commit
//! that applied the change, so the log never disagrees with the state.
//! Delivering them (email, in-app notices) is the caller's job.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::conflict::RespondentRole;
use crate::decision::DecisionKind;
use crate::ids::{
    DecisionId, EditorAssignmentId, EventId, ManuscriptId, ReviewAssignmentId, RevisionId, UserId,
};
use crate::manuscript::ManuscriptStatus;
use crate::review::Recommendation;

/// An event addressed to one recipient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique event ID
    pub id: EventId,
    /// Event timestamp
    pub timestamp: DateTime<Utc>,
    /// Manuscript the event is about
    pub manuscript_id: ManuscriptId,
    /// Who should be told
    pub recipient_id: UserId,
    /// Who caused it
    pub actor_id: UserId,
    /// Event payload
    pub payload: EventPayload,
}

impl Event {
    /// Create a new event
    pub fn new(
        manuscript_id: ManuscriptId,
        recipient_id: UserId,
        actor_id: UserId,
        payload: EventPayload,
    ) -> Self {
        Self {
            id: EventId::new(),
            timestamp: Utc::now(),
            manuscript_id,
            recipient_id,
            actor_id,
            payload,
        }
    }

    pub fn kind(&self) -> &'static str {
        self.payload.kind()
    }
}

/// What happened
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventPayload {
    SubmissionReceived {
        title: String,
    },
    TechnicalCheckPassed {
        status: ManuscriptStatus,
    },
    EditorAssigned {
        assignment_id: EditorAssignmentId,
        editor_id: UserId,
    },
    EditorUnassigned {
        editor_id: UserId,
    },
    ReviewerInvited {
        assignment_id: ReviewAssignmentId,
        reviewer_id: UserId,
        due_at: DateTime<Utc>,
    },
    ReviewInvitationAnswered {
        assignment_id: ReviewAssignmentId,
        reviewer_id: UserId,
        accepted: bool,
    },
    ReviewSubmitted {
        assignment_id: ReviewAssignmentId,
        reviewer_id: UserId,
        recommendation: Recommendation,
    },
    DecisionRecorded {
        decision_id: DecisionId,
        decision: DecisionKind,
        status: ManuscriptStatus,
    },
    RevisionSubmitted {
        revision_id: RevisionId,
        version: u32,
    },
    ConflictDeclared {
        respondent_id: UserId,
        role: RespondentRole,
        detail: String,
    },
    ManuscriptPublished {
        issue: String,
    },
}

impl EventPayload {
    /// Wire name of the payload kind
    pub fn kind(&self) -> &'static str {
        match self {
            EventPayload::SubmissionReceived { .. } => "submission_received",
            EventPayload::TechnicalCheckPassed { .. } => "technical_check_passed",
            EventPayload::EditorAssigned { .. } => "editor_assigned",
            EventPayload::EditorUnassigned { .. } => "editor_unassigned",
            EventPayload::ReviewerInvited { .. } => "reviewer_invited",
            EventPayload::ReviewInvitationAnswered { .. } => "review_invitation_answered",
            EventPayload::ReviewSubmitted { .. } => "review_submitted",
            EventPayload::DecisionRecorded { .. } => "decision_recorded",
            EventPayload::RevisionSubmitted { .. } => "revision_submitted",
            EventPayload::ConflictDeclared { .. } => "conflict_declared",
            EventPayload::ManuscriptPublished { .. } => "manuscript_published",
        }
    }

    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            EventPayload::SubmissionReceived { title } => format!("Submission received: {}", title),
            EventPayload::TechnicalCheckPassed { status } => {
                format!("Technical check passed, now {}", status)
            }
            EventPayload::EditorAssigned { editor_id, .. } => {
                format!("Associate editor assigned: {}", editor_id)
            }
            EventPayload::EditorUnassigned { editor_id } => {
                format!("Associate editor unassigned: {}", editor_id)
            }
            EventPayload::ReviewerInvited {
                reviewer_id,
                due_at,
                ..
            } => format!(
                "Reviewer {} invited, due {}",
                reviewer_id,
                due_at.format("%Y-%m-%d")
            ),
            EventPayload::ReviewInvitationAnswered {
                reviewer_id,
                accepted,
                ..
            } => format!(
                "Reviewer {} {} the invitation",
                reviewer_id,
                if *accepted { "accepted" } else { "declined" }
            ),
            EventPayload::ReviewSubmitted {
                reviewer_id,
                recommendation,
                ..
            } => format!("Review from {}: {}", reviewer_id, recommendation),
            EventPayload::DecisionRecorded {
                decision, status, ..
            } => format!("Decision: {} (now {})", decision, status),
            EventPayload::RevisionSubmitted { version, .. } => {
                format!("Revision submitted: version {}", version)
            }
            EventPayload::ConflictDeclared {
                respondent_id,
                role,
                detail,
            } => {
                if detail.is_empty() {
                    format!("{} ({}) declared a conflict of interest", respondent_id, role)
                } else {
                    format!(
                        "{} ({}) declared a conflict of interest: {}",
                        respondent_id, role, detail
                    )
                }
            }
            EventPayload::ManuscriptPublished { issue } => format!("Published in {}", issue),
        }
    }
}
