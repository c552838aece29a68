//! Error types for editorial-core
//!
//! Expected business-rule failures (invalid transitions, duplicate
//! assignments, declared conflicts...) are ordinary `Err` values of
//! [`EditorialError`]. Infrastructure failures arrive as
//! [`EditorialError::Storage`] and are the only fatal ones.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::{ManuscriptId, ReviewAssignmentId, UserId};
use crate::manuscript::ManuscriptStatus;
use crate::role::Role;

/// Result type alias for editorial operations
pub type Result<T> = std::result::Result<T, EditorialError>;

/// Kind of entity named in a not-found error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Manuscript,
    User,
    ReviewAssignment,
    EditorAssignment,
    Revision,
    Decision,
    Questionnaire,
    Event,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Manuscript => write!(f, "manuscript"),
            EntityKind::User => write!(f, "user"),
            EntityKind::ReviewAssignment => write!(f, "review assignment"),
            EntityKind::EditorAssignment => write!(f, "editor assignment"),
            EntityKind::Revision => write!(f, "revision"),
            EntityKind::Decision => write!(f, "decision"),
            EntityKind::Questionnaire => write!(f, "conflict questionnaire"),
            EntityKind::Event => write!(f, "event"),
        }
    }
}

/// A single field-level validation problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn join_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Main error type for engine operations
#[derive(Error, Debug)]
pub enum EditorialError {
    /// Malformed or incomplete input
    #[error("Validation failed: {}", join_fields(.0))]
    Validation(Vec<FieldError>),

    /// Article submission rejected before anything was persisted
    #[error("Submission failed")]
    SubmissionFailed { errors: Vec<FieldError> },

    /// Trigger invoked from a status that does not allow it
    #[error("Invalid transition: cannot {trigger} from {from}")]
    InvalidTransition {
        from: ManuscriptStatus,
        trigger: String,
    },

    /// Operation requires the manuscript (or record) to be in another state
    #[error("Invalid state for {manuscript_id}: {message}")]
    InvalidState {
        manuscript_id: ManuscriptId,
        message: String,
    },

    /// Actor lacks the capability or relationship needed
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Actor is not the author of the manuscript
    #[error("User {actor} is not the author of manuscript {manuscript_id}")]
    NotAuthor {
        manuscript_id: ManuscriptId,
        actor: UserId,
    },

    /// User does not hold the role the operation needs
    #[error("User {user_id} does not hold the {required} role")]
    Role { user_id: UserId, required: Role },

    /// Missing entity
    #[error("Not found: {entity} {id}")]
    NotFound { entity: EntityKind, id: String },

    /// Reviewer already holds an active assignment on the manuscript
    #[error("Reviewer {reviewer_id} already has an active assignment on manuscript {manuscript_id}")]
    DuplicateAssignment {
        manuscript_id: ManuscriptId,
        reviewer_id: UserId,
    },

    /// Write-once record submitted twice
    #[error("Duplicate submission: {0}")]
    DuplicateSubmission(String),

    /// Manuscript already has an active associate editor
    #[error("Manuscript {manuscript_id} already has associate editor {editor_id}")]
    AlreadyAssigned {
        manuscript_id: ManuscriptId,
        editor_id: UserId,
    },

    /// Review assignment already completed
    #[error("Review assignment {0} is already completed")]
    AlreadyCompleted(ReviewAssignmentId),

    /// More than one eligible candidate and none was named
    #[error("Ambiguous assignment: {candidates} eligible candidates")]
    AmbiguousAssignment { candidates: usize },

    /// No eligible candidate at all
    #[error("No eligible candidate for manuscript {0}")]
    NoEligibleCandidate(ManuscriptId),

    /// Candidate is at their concurrent assignment limit
    #[error("User {user_id} has {active} active assignments (limit {limit})")]
    CapacityExceeded {
        user_id: UserId,
        active: u32,
        limit: u32,
    },

    /// Candidate has a declared or structural conflict of interest
    #[error("Conflict of interest for {user_id}: {detail}")]
    ConflictOfInterest { user_id: UserId, detail: String },

    /// Another mutating operation holds the manuscript
    #[error("Manuscript {0} is busy, try again")]
    ManuscriptBusy(ManuscriptId),

    /// Storage failure
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Coarse grouping of errors, used by callers to pick a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    BusinessRule,
    Authorization,
    NotFound,
    Idempotency,
    AssignmentSelection,
    Busy,
    Infrastructure,
}

impl EditorialError {
    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            EditorialError::Validation(_) | EditorialError::SubmissionFailed { .. } => {
                ErrorKind::Validation
            }
            EditorialError::InvalidTransition { .. }
            | EditorialError::InvalidState { .. }
            | EditorialError::CapacityExceeded { .. }
            | EditorialError::ConflictOfInterest { .. } => ErrorKind::BusinessRule,
            EditorialError::AccessDenied(_)
            | EditorialError::NotAuthor { .. }
            | EditorialError::Role { .. } => ErrorKind::Authorization,
            EditorialError::NotFound { .. } => ErrorKind::NotFound,
            EditorialError::DuplicateAssignment { .. }
            | EditorialError::DuplicateSubmission(_)
            | EditorialError::AlreadyAssigned { .. }
            | EditorialError::AlreadyCompleted(_) => ErrorKind::Idempotency,
            EditorialError::AmbiguousAssignment { .. }
            | EditorialError::NoEligibleCandidate(_) => ErrorKind::AssignmentSelection,
            EditorialError::ManuscriptBusy(_) => ErrorKind::Busy,
            EditorialError::Storage(_) => ErrorKind::Infrastructure,
        }
    }

    /// Only infrastructure failures are fatal
    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::Infrastructure
    }

    /// Field-level detail for validation failures
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            EditorialError::Validation(errors) => errors,
            EditorialError::SubmissionFailed { errors } => errors,
            _ => &[],
        }
    }

    pub(crate) fn not_found(entity: EntityKind, id: impl ToString) -> Self {
        EditorialError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Storage-specific errors
#[derive(Error, Debug)]
pub enum StorageError {
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A uniqueness or integrity constraint was violated on commit
    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// Backend unreachable or poisoned
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Schema version mismatch
    #[error("Schema version mismatch: expected {expected}, got {actual}")]
    SchemaVersionMismatch { expected: u32, actual: u32 },
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for EditorialError {
    fn from(err: rusqlite::Error) -> Self {
        EditorialError::Storage(StorageError::Database(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_failed_message_is_generic() {
        let err = EditorialError::SubmissionFailed {
            errors: vec![FieldError::new("title", "too short")],
        };
        assert_eq!(err.to_string(), "Submission failed");
        assert_eq!(err.field_errors().len(), 1);
    }

    #[test]
    fn test_only_storage_is_fatal() {
        assert!(EditorialError::Storage(StorageError::Unavailable("down".into())).is_fatal());
        assert!(!EditorialError::AccessDenied("no".into()).is_fatal());
        assert!(!EditorialError::Validation(vec![]).is_fatal());
    }

    #[test]
    fn test_kinds() {
        let err = EditorialError::DuplicateSubmission("q".into());
        assert_eq!(err.kind(), ErrorKind::Idempotency);

        let err = EditorialError::AmbiguousAssignment { candidates: 2 };
        assert_eq!(err.kind(), ErrorKind::AssignmentSelection);
    }

    #[test]
    fn test_validation_message_lists_fields() {
        let err = EditorialError::Validation(vec![
            FieldError::new("files", "at least one file is required"),
            FieldError::new("response_to_reviewers", "required"),
        ]);
        let msg = err.to_string();
        assert!(msg.contains("files"));
        assert!(msg.contains("response_to_reviewers"));
    }
}
