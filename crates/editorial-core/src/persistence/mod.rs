//! Storage collaborator
//!
//! The engine reads through typed queries and writes through a single
//! [`Storage::commit`] per operation, so a failed validation never leaves a
//! partial write behind. [`InMemoryStorage`] is always available; the
//! SQLite-backed [`SqliteStorage`] needs the `sqlite` feature.

mod memory;
#[cfg(feature = "sqlite")]
mod schema;
#[cfg(feature = "sqlite")]
mod sqlite;

pub use memory::InMemoryStorage;
#[cfg(feature = "sqlite")]
pub use schema::{Schema, SCHEMA_VERSION};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStorage;

use crate::assignment::{EditorAssignment, ReviewAssignment};
use crate::conflict::{ConflictQuestionnaire, RespondentRole};
use crate::decision::Decision;
use crate::error::StorageError;
use crate::event::Event;
use crate::ids::{ManuscriptId, ReviewAssignmentId, UserId};
use crate::manuscript::{Manuscript, ManuscriptStatus};
use crate::revision::Revision;

/// Result type for storage calls
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Everything one engine operation writes
///
/// Manuscripts and assignments are upserted; revisions, decisions,
/// questionnaires and events are inserted and must not already exist.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    pub manuscripts: Vec<Manuscript>,
    pub review_assignments: Vec<ReviewAssignment>,
    pub editor_assignments: Vec<EditorAssignment>,
    pub revisions: Vec<Revision>,
    pub decisions: Vec<Decision>,
    pub questionnaires: Vec<ConflictQuestionnaire>,
    pub events: Vec<Event>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn manuscript(mut self, manuscript: Manuscript) -> Self {
        self.manuscripts.push(manuscript);
        self
    }

    pub fn review_assignment(mut self, assignment: ReviewAssignment) -> Self {
        self.review_assignments.push(assignment);
        self
    }

    pub fn editor_assignment(mut self, assignment: EditorAssignment) -> Self {
        self.editor_assignments.push(assignment);
        self
    }

    pub fn revision(mut self, revision: Revision) -> Self {
        self.revisions.push(revision);
        self
    }

    pub fn decision(mut self, decision: Decision) -> Self {
        self.decisions.push(decision);
        self
    }

    pub fn questionnaire(mut self, questionnaire: ConflictQuestionnaire) -> Self {
        self.questionnaires.push(questionnaire);
        self
    }

    pub fn events(mut self, events: impl IntoIterator<Item = Event>) -> Self {
        self.events.extend(events);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.manuscripts.is_empty()
            && self.review_assignments.is_empty()
            && self.editor_assignments.is_empty()
            && self.revisions.is_empty()
            && self.decisions.is_empty()
            && self.questionnaires.is_empty()
            && self.events.is_empty()
    }
}

/// Persistence backend for the workflow engine
///
/// Implementations must give read-your-writes consistency and apply a
/// [`ChangeSet`] all-or-nothing.
pub trait Storage: Send + Sync {
    fn load_manuscript(&self, id: ManuscriptId) -> StorageResult<Option<Manuscript>>;

    /// Manuscripts in a status, oldest submission first
    fn manuscripts_by_status(&self, status: ManuscriptStatus) -> StorageResult<Vec<Manuscript>>;

    fn review_assignment(&self, id: ReviewAssignmentId) -> StorageResult<Option<ReviewAssignment>>;

    /// All review assignments of a manuscript, in creation order
    fn review_assignments_for(&self, manuscript_id: ManuscriptId)
        -> StorageResult<Vec<ReviewAssignment>>;

    /// Active review assignments a reviewer holds on open manuscripts
    fn active_review_load(&self, reviewer_id: &UserId) -> StorageResult<u32>;

    fn active_editor_assignment(
        &self,
        manuscript_id: ManuscriptId,
    ) -> StorageResult<Option<EditorAssignment>>;

    /// Open manuscripts an editor is actively handling
    fn active_editor_load(&self, editor_id: &UserId) -> StorageResult<u32>;

    /// Revisions ascending by version
    fn revisions_for(&self, manuscript_id: ManuscriptId) -> StorageResult<Vec<Revision>>;

    /// Decisions in the order they were taken
    fn decisions_for(&self, manuscript_id: ManuscriptId) -> StorageResult<Vec<Decision>>;

    fn questionnaire(
        &self,
        manuscript_id: ManuscriptId,
        respondent_id: &UserId,
        role: RespondentRole,
    ) -> StorageResult<Option<ConflictQuestionnaire>>;

    /// Audit log of a manuscript, oldest first
    fn events_for(&self, manuscript_id: ManuscriptId) -> StorageResult<Vec<Event>>;

    /// Apply every change or none
    fn commit(&self, changes: ChangeSet) -> StorageResult<()>;
}
