//! Editorial Core - Manuscript workflow engine for a scholarly journal
//!
//! This crate provides the core of the editorial system:
//!
//! - **Manuscript**: Submission, validation and the status state machine
//!   (Submitted→TechnicalCheck→UnderReview→RevisionRequested→Accepted→Published)
//! - **Assignment**: Associate editor and reviewer assignment with eligibility,
//!   conflict-of-interest and capacity checks
//! - **Review**: Reviewer feedback, role-filtered review listings and summaries
//! - **Revision**: Gap-free manuscript versioning across revision cycles
//! - **Conflict**: Conflict-of-interest questionnaires and their evaluation
//! - **Decision**: Editorial decisions and the status they lead to
//! - **Event**: Per-recipient domain events, kept as an audit log
//! - **Notification**: Email rendering and best-effort dispatch of events
//! - **Persistence**: Atomic change-set storage (in-memory, SQLite)
//! - **Workflow**: The engine that coordinates all of the above under
//!   per-manuscript locks
//! - **Config**: Review windows, capacity limits and revision policy
//!
//! # Architecture
//!
//! Every mutating operation on [`WorkflowEngine`] follows the same shape:
//! - Check the actor's capability and take the manuscript lock
//! - Load, validate, and compute the new state through the status table
//! - Commit every changed record and the produced events in one change set
//! - Return an [`Outcome`] carrying the events for the caller to deliver
//!
//! ```text
//! submitted → technical_check → under_review ⇄ revision_requested
//!                    ↓               ↓               ↓
//!                 rejected        accepted → published
//! ```

pub mod assignment;
pub mod config;
pub mod conflict;
pub mod decision;
pub mod directory;
pub mod error;
pub mod event;
pub mod ids;
pub mod manuscript;
pub mod notification;
pub mod persistence;
pub mod review;
pub mod revision;
pub mod role;
pub mod workflow;

pub use assignment::{EditorAssignment, ReviewAssignment, ReviewAssignmentStatus};
pub use config::{CapacityPolicy, EditorialConfig, ReReviewPolicy};
pub use conflict::{ConflictQuestionnaire, ConflictQuestionnaireInput, ConflictResult, RespondentRole};
pub use decision::{Decision, DecisionKind};
pub use directory::{Directory, InMemoryDirectory, Member};
pub use error::{EditorialError, EntityKind, ErrorKind, FieldError, Result, StorageError};
pub use event::{Event, EventPayload};
pub use ids::{
    DecisionId, EditorAssignmentId, EventId, ManuscriptId, QuestionnaireId, ReviewAssignmentId,
    RevisionId, UserId,
};
pub use manuscript::{ArticleSubmission, Manuscript, ManuscriptFile, ManuscriptStatus, Trigger};
pub use notification::{dispatch, DispatchReport, EmailMessage, MailError, Mailer};
pub use persistence::{ChangeSet, InMemoryStorage, Storage};
#[cfg(feature = "sqlite")]
pub use persistence::SqliteStorage;
pub use review::{Recommendation, ReviewFeedback, ReviewSummary, ReviewView, SubScores};
pub use revision::{Revision, RevisionInput, RevisionReceipt, ValidationResult};
pub use role::{Actor, Capabilities, Role};
pub use workflow::{Outcome, WorkflowEngine};

/// Returns the version of editorial-core
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_statuses() {
        let mut status = ManuscriptStatus::Submitted;

        assert!(status.can_transition_to(&ManuscriptStatus::TechnicalCheck));
        status = ManuscriptStatus::TechnicalCheck;

        assert!(status.can_transition_to(&ManuscriptStatus::UnderReview));
        status = ManuscriptStatus::UnderReview;

        // Revision cycles loop back to review
        assert!(status.can_transition_to(&ManuscriptStatus::RevisionRequested));
        assert!(ManuscriptStatus::RevisionRequested.can_transition_to(&ManuscriptStatus::UnderReview));

        assert!(status.can_transition_to(&ManuscriptStatus::Accepted));
        status = ManuscriptStatus::Accepted;
        assert!(status.can_transition_to(&ManuscriptStatus::Published));
        assert!(!status.can_transition_to(&ManuscriptStatus::Rejected));
    }

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
