//! In-memory storage

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{ChangeSet, Storage, StorageResult};
use crate::assignment::{EditorAssignment, ReviewAssignment};
use crate::conflict::{ConflictQuestionnaire, RespondentRole};
use crate::decision::Decision;
use crate::error::StorageError;
use crate::event::Event;
use crate::ids::{EditorAssignmentId, ManuscriptId, ReviewAssignmentId, UserId};
use crate::manuscript::{Manuscript, ManuscriptStatus};
use crate::revision::Revision;

#[derive(Debug, Default)]
struct Tables {
    manuscripts: HashMap<ManuscriptId, Manuscript>,
    review_assignments: HashMap<ReviewAssignmentId, ReviewAssignment>,
    /// Assignment ids per manuscript, in insertion order
    review_index: HashMap<ManuscriptId, Vec<ReviewAssignmentId>>,
    editor_assignments: HashMap<EditorAssignmentId, EditorAssignment>,
    editor_index: HashMap<ManuscriptId, Vec<EditorAssignmentId>>,
    revisions: HashMap<ManuscriptId, BTreeMap<u32, Revision>>,
    decisions: HashMap<ManuscriptId, Vec<Decision>>,
    questionnaires: HashMap<(ManuscriptId, UserId, RespondentRole), ConflictQuestionnaire>,
    events: HashMap<ManuscriptId, Vec<Event>>,
}

impl Tables {
    fn is_open(&self, manuscript_id: &ManuscriptId) -> bool {
        self.manuscripts
            .get(manuscript_id)
            .map(|m| !m.status.is_terminal())
            .unwrap_or(false)
    }

    /// Reject inserts that collide with existing rows or with each other
    fn check_constraints(&self, changes: &ChangeSet) -> StorageResult<()> {
        let mut versions = std::collections::HashSet::new();
        for revision in &changes.revisions {
            let taken = self
                .revisions
                .get(&revision.manuscript_id)
                .map(|r| r.contains_key(&revision.version))
                .unwrap_or(false);
            if taken || !versions.insert((revision.manuscript_id, revision.version)) {
                return Err(StorageError::Constraint(format!(
                    "revision {} of manuscript {} already exists",
                    revision.version, revision.manuscript_id
                )));
            }
        }

        let mut keys = std::collections::HashSet::new();
        for questionnaire in &changes.questionnaires {
            let key = questionnaire.key();
            if self.questionnaires.contains_key(&key) || !keys.insert(key) {
                return Err(StorageError::Constraint(format!(
                    "questionnaire from {} as {} on {} already exists",
                    questionnaire.respondent_id, questionnaire.role, questionnaire.manuscript_id
                )));
            }
        }

        Ok(())
    }
}

/// Storage held in process memory, guarded by one read/write lock
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    tables: RwLock<Tables>,
    unavailable: AtomicBool,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail as if the backend were down
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn read(&self) -> StorageResult<RwLockReadGuard<'_, Tables>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("storage is offline".to_string()));
        }
        self.tables
            .read()
            .map_err(|_| StorageError::Unavailable("storage lock poisoned".to_string()))
    }

    fn write(&self) -> StorageResult<RwLockWriteGuard<'_, Tables>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("storage is offline".to_string()));
        }
        self.tables
            .write()
            .map_err(|_| StorageError::Unavailable("storage lock poisoned".to_string()))
    }
}

impl Storage for InMemoryStorage {
    fn load_manuscript(&self, id: ManuscriptId) -> StorageResult<Option<Manuscript>> {
        Ok(self.read()?.manuscripts.get(&id).cloned())
    }

    fn manuscripts_by_status(&self, status: ManuscriptStatus) -> StorageResult<Vec<Manuscript>> {
        let tables = self.read()?;
        let mut found: Vec<_> = tables
            .manuscripts
            .values()
            .filter(|m| m.status == status)
            .cloned()
            .collect();
        found.sort_by_key(|m| (m.submitted_at, m.id));
        Ok(found)
    }

    fn review_assignment(&self, id: ReviewAssignmentId) -> StorageResult<Option<ReviewAssignment>> {
        Ok(self.read()?.review_assignments.get(&id).cloned())
    }

    fn review_assignments_for(
        &self,
        manuscript_id: ManuscriptId,
    ) -> StorageResult<Vec<ReviewAssignment>> {
        let tables = self.read()?;
        Ok(tables
            .review_index
            .get(&manuscript_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| tables.review_assignments.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default())
    }

    fn active_review_load(&self, reviewer_id: &UserId) -> StorageResult<u32> {
        let tables = self.read()?;
        let count = tables
            .review_assignments
            .values()
            .filter(|a| &a.reviewer_id == reviewer_id && a.is_active())
            .filter(|a| tables.is_open(&a.manuscript_id))
            .count();
        Ok(count as u32)
    }

    fn active_editor_assignment(
        &self,
        manuscript_id: ManuscriptId,
    ) -> StorageResult<Option<EditorAssignment>> {
        let tables = self.read()?;
        Ok(tables.editor_index.get(&manuscript_id).and_then(|ids| {
            ids.iter()
                .filter_map(|id| tables.editor_assignments.get(id))
                .find(|a| a.is_active())
                .cloned()
        }))
    }

    fn active_editor_load(&self, editor_id: &UserId) -> StorageResult<u32> {
        let tables = self.read()?;
        let count = tables
            .editor_assignments
            .values()
            .filter(|a| &a.editor_id == editor_id && a.is_active())
            .filter(|a| tables.is_open(&a.manuscript_id))
            .count();
        Ok(count as u32)
    }

    fn revisions_for(&self, manuscript_id: ManuscriptId) -> StorageResult<Vec<Revision>> {
        Ok(self
            .read()?
            .revisions
            .get(&manuscript_id)
            .map(|r| r.values().cloned().collect())
            .unwrap_or_default())
    }

    fn decisions_for(&self, manuscript_id: ManuscriptId) -> StorageResult<Vec<Decision>> {
        Ok(self
            .read()?
            .decisions
            .get(&manuscript_id)
            .cloned()
            .unwrap_or_default())
    }

    fn questionnaire(
        &self,
        manuscript_id: ManuscriptId,
        respondent_id: &UserId,
        role: RespondentRole,
    ) -> StorageResult<Option<ConflictQuestionnaire>> {
        Ok(self
            .read()?
            .questionnaires
            .get(&(manuscript_id, respondent_id.clone(), role))
            .cloned())
    }

    fn events_for(&self, manuscript_id: ManuscriptId) -> StorageResult<Vec<Event>> {
        Ok(self
            .read()?
            .events
            .get(&manuscript_id)
            .cloned()
            .unwrap_or_default())
    }

    fn commit(&self, changes: ChangeSet) -> StorageResult<()> {
        let mut tables = self.write()?;
        tables.check_constraints(&changes)?;

        for manuscript in changes.manuscripts {
            tables.manuscripts.insert(manuscript.id, manuscript);
        }

        for assignment in changes.review_assignments {
            if !tables.review_assignments.contains_key(&assignment.id) {
                tables
                    .review_index
                    .entry(assignment.manuscript_id)
                    .or_default()
                    .push(assignment.id);
            }
            tables.review_assignments.insert(assignment.id, assignment);
        }

        for assignment in changes.editor_assignments {
            if !tables.editor_assignments.contains_key(&assignment.id) {
                tables
                    .editor_index
                    .entry(assignment.manuscript_id)
                    .or_default()
                    .push(assignment.id);
            }
            tables.editor_assignments.insert(assignment.id, assignment);
        }

        for revision in changes.revisions {
            tables
                .revisions
                .entry(revision.manuscript_id)
                .or_default()
                .insert(revision.version, revision);
        }

        for decision in changes.decisions {
            tables
                .decisions
                .entry(decision.manuscript_id)
                .or_default()
                .push(decision);
        }

        for questionnaire in changes.questionnaires {
            tables.questionnaires.insert(questionnaire.key(), questionnaire);
        }

        for event in changes.events {
            tables
                .events
                .entry(event.manuscript_id)
                .or_default()
                .push(event);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manuscript::ArticleSubmission;

    fn manuscript() -> Manuscript {
        Manuscript::from_submission(UserId::from("author-1"), ArticleSubmission::sample_valid())
    }

    #[test]
    fn test_commit_and_read_back() {
        let storage = InMemoryStorage::new();
        let m = manuscript();
        storage
            .commit(
                ChangeSet::new()
                    .manuscript(m.clone())
                    .revision(Revision::initial(&m)),
            )
            .unwrap();

        assert_eq!(storage.load_manuscript(m.id).unwrap(), Some(m.clone()));
        assert_eq!(storage.revisions_for(m.id).unwrap().len(), 1);
        assert_eq!(
            storage
                .manuscripts_by_status(ManuscriptStatus::Submitted)
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn test_duplicate_revision_rejects_whole_change_set() {
        let storage = InMemoryStorage::new();
        let m = manuscript();
        storage
            .commit(ChangeSet::new().manuscript(m.clone()).revision(Revision::initial(&m)))
            .unwrap();

        let mut renamed = m.clone();
        renamed.title = "Something else entirely".to_string();
        let err = storage
            .commit(
                ChangeSet::new()
                    .manuscript(renamed)
                    .revision(Revision::initial(&m)),
            )
            .unwrap_err();

        assert!(matches!(err, StorageError::Constraint(_)));
        assert_eq!(storage.load_manuscript(m.id).unwrap().unwrap().title, m.title);
    }

    #[test]
    fn test_load_counts_only_active_on_open_manuscripts() {
        let storage = InMemoryStorage::new();
        let mut m = manuscript();
        let reviewer = UserId::from("rev-1");
        let mut done = ReviewAssignment::new(m.id, reviewer.clone(), UserId::from("ed"), 1, 21);
        done.respond(false).unwrap();
        let open = ReviewAssignment::new(m.id, reviewer.clone(), UserId::from("ed"), 1, 21);

        storage
            .commit(
                ChangeSet::new()
                    .manuscript(m.clone())
                    .review_assignment(done)
                    .review_assignment(open),
            )
            .unwrap();
        assert_eq!(storage.active_review_load(&reviewer).unwrap(), 1);

        m.status = ManuscriptStatus::Rejected;
        storage.commit(ChangeSet::new().manuscript(m)).unwrap();
        assert_eq!(storage.active_review_load(&reviewer).unwrap(), 0);
    }

    #[test]
    fn test_unavailable() {
        let storage = InMemoryStorage::new();
        storage.set_unavailable(true);
        assert!(matches!(
            storage.load_manuscript(ManuscriptId::new()),
            Err(StorageError::Unavailable(_))
        ));
    }
}
