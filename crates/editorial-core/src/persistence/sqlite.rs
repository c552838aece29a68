//! SQLite-backed storage

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::schema::{Schema, SCHEMA_VERSION};
use super::{ChangeSet, Storage, StorageResult};
use crate::assignment::{EditorAssignment, ReviewAssignment};
use crate::conflict::{ConflictQuestionnaire, RespondentRole};
use crate::decision::Decision;
use crate::error::StorageError;
use crate::event::Event;
use crate::ids::{ManuscriptId, ReviewAssignmentId, UserId};
use crate::manuscript::{Manuscript, ManuscriptStatus};
use crate::revision::Revision;

/// Storage in a single SQLite database
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Open (or create) a database file
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        Self::with_connection(Connection::open(path)?)
    }

    /// Create an in-memory database (for testing)
    pub fn in_memory() -> StorageResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> StorageResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Self::initialize(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create tables on a fresh database, migrate an older one
    fn initialize(conn: &Connection) -> StorageResult<()> {
        let current_version = Self::schema_version(conn).unwrap_or(0);

        if current_version > SCHEMA_VERSION {
            return Err(StorageError::SchemaVersionMismatch {
                expected: SCHEMA_VERSION,
                actual: current_version,
            });
        }

        if current_version == 0 {
            conn.execute_batch(Schema::create_tables())?;
            Self::set_schema_version(conn, SCHEMA_VERSION)?;
        } else if current_version < SCHEMA_VERSION {
            for version in current_version..SCHEMA_VERSION {
                if let Some(migration) = Schema::migration(version, version + 1) {
                    conn.execute_batch(migration)?;
                }
            }
            Self::set_schema_version(conn, SCHEMA_VERSION)?;
        }

        Ok(())
    }

    fn schema_version(conn: &Connection) -> Option<u32> {
        conn.query_row(
            "SELECT MAX(version) FROM schema_version",
            [],
            |row| row.get::<_, Option<u32>>(0),
        )
        .ok()
        .flatten()
    }

    fn set_schema_version(conn: &Connection, version: u32) -> StorageResult<()> {
        conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            [version],
        )?;
        Ok(())
    }

    fn conn(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Unavailable("connection lock poisoned".to_string()))
    }

    /// Run a query returning JSON documents and decode them
    fn query_docs<T: DeserializeOwned>(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> StorageResult<Vec<T>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)?;
        let docs = stmt
            .query_map(params, |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        docs.iter()
            .map(|doc| serde_json::from_str(doc).map_err(StorageError::from))
            .collect()
    }

    fn query_doc<T: DeserializeOwned>(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> StorageResult<Option<T>> {
        let conn = self.conn()?;
        let doc: Option<String> = conn
            .query_row(sql, params, |row| row.get(0))
            .optional()?;
        doc.map(|d| serde_json::from_str(&d).map_err(StorageError::from))
            .transpose()
    }

    fn count(&self, sql: &str, user_id: &UserId) -> StorageResult<u32> {
        let conn = self.conn()?;
        let count: u32 = conn.query_row(sql, [user_id.as_str()], |row| row.get(0))?;
        Ok(count)
    }

    fn apply(tx: &Transaction<'_>, changes: &ChangeSet) -> StorageResult<()> {
        for m in &changes.manuscripts {
            tx.execute(
                r#"
                INSERT INTO manuscripts (id, status, author_id, submitted_at, updated_at, data)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(id) DO UPDATE SET
                    status = excluded.status,
                    updated_at = excluded.updated_at,
                    data = excluded.data
                "#,
                params![
                    m.id.to_string(),
                    m.status.as_str(),
                    m.author_id.as_str(),
                    timestamp(&m.submitted_at),
                    timestamp(&m.updated_at),
                    to_doc(m)?,
                ],
            )?;
        }

        for a in &changes.review_assignments {
            tx.execute(
                r#"
                INSERT INTO review_assignments (id, seq, manuscript_id, reviewer_id, status, data)
                VALUES (?1, (SELECT COALESCE(MAX(seq), 0) + 1 FROM review_assignments), ?2, ?3, ?4, ?5)
                ON CONFLICT(id) DO UPDATE SET
                    status = excluded.status,
                    data = excluded.data
                "#,
                params![
                    a.id.to_string(),
                    a.manuscript_id.to_string(),
                    a.reviewer_id.as_str(),
                    a.status.as_str(),
                    to_doc(a)?,
                ],
            )?;
        }

        for a in &changes.editor_assignments {
            tx.execute(
                r#"
                INSERT INTO editor_assignments (id, seq, manuscript_id, editor_id, active, data)
                VALUES (?1, (SELECT COALESCE(MAX(seq), 0) + 1 FROM editor_assignments), ?2, ?3, ?4, ?5)
                ON CONFLICT(id) DO UPDATE SET
                    active = excluded.active,
                    data = excluded.data
                "#,
                params![
                    a.id.to_string(),
                    a.manuscript_id.to_string(),
                    a.editor_id.as_str(),
                    a.is_active(),
                    to_doc(a)?,
                ],
            )?;
        }

        for r in &changes.revisions {
            tx.execute(
                "INSERT INTO revisions (id, manuscript_id, version, data) VALUES (?1, ?2, ?3, ?4)",
                params![
                    r.id.to_string(),
                    r.manuscript_id.to_string(),
                    r.version,
                    to_doc(r)?,
                ],
            )
            .map_err(constraint_error)?;
        }

        for d in &changes.decisions {
            tx.execute(
                r#"
                INSERT INTO decisions (id, seq, manuscript_id, data)
                VALUES (?1, (SELECT COALESCE(MAX(seq), 0) + 1 FROM decisions), ?2, ?3)
                "#,
                params![d.id.to_string(), d.manuscript_id.to_string(), to_doc(d)?],
            )
            .map_err(constraint_error)?;
        }

        for q in &changes.questionnaires {
            tx.execute(
                r#"
                INSERT INTO questionnaires (id, manuscript_id, respondent_id, role, data)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    q.id.to_string(),
                    q.manuscript_id.to_string(),
                    q.respondent_id.as_str(),
                    q.role.as_str(),
                    to_doc(q)?,
                ],
            )
            .map_err(constraint_error)?;
        }

        for e in &changes.events {
            tx.execute(
                r#"
                INSERT INTO events (id, manuscript_id, recipient_id, kind, timestamp, data)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    e.id.to_string(),
                    e.manuscript_id.to_string(),
                    e.recipient_id.as_str(),
                    e.kind(),
                    timestamp(&e.timestamp),
                    to_doc(e)?,
                ],
            )
            .map_err(constraint_error)?;
        }

        Ok(())
    }
}

fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn to_doc<T: Serialize>(value: &T) -> StorageResult<String> {
    Ok(serde_json::to_string(value)?)
}

fn constraint_error(err: rusqlite::Error) -> StorageError {
    match err.sqlite_error_code() {
        Some(rusqlite::ErrorCode::ConstraintViolation) => StorageError::Constraint(err.to_string()),
        _ => StorageError::from(err),
    }
}

const TERMINAL_STATUSES: &str = "('published', 'rejected')";

impl Storage for SqliteStorage {
    fn load_manuscript(&self, id: ManuscriptId) -> StorageResult<Option<Manuscript>> {
        self.query_doc("SELECT data FROM manuscripts WHERE id = ?1", [id.to_string()])
    }

    fn manuscripts_by_status(&self, status: ManuscriptStatus) -> StorageResult<Vec<Manuscript>> {
        self.query_docs(
            "SELECT data FROM manuscripts WHERE status = ?1 ORDER BY submitted_at, id",
            [status.as_str()],
        )
    }

    fn review_assignment(&self, id: ReviewAssignmentId) -> StorageResult<Option<ReviewAssignment>> {
        self.query_doc(
            "SELECT data FROM review_assignments WHERE id = ?1",
            [id.to_string()],
        )
    }

    fn review_assignments_for(
        &self,
        manuscript_id: ManuscriptId,
    ) -> StorageResult<Vec<ReviewAssignment>> {
        self.query_docs(
            "SELECT data FROM review_assignments WHERE manuscript_id = ?1 ORDER BY seq",
            [manuscript_id.to_string()],
        )
    }

    fn active_review_load(&self, reviewer_id: &UserId) -> StorageResult<u32> {
        self.count(
            &format!(
                r#"
                SELECT COUNT(*) FROM review_assignments ra
                JOIN manuscripts m ON m.id = ra.manuscript_id
                WHERE ra.reviewer_id = ?1
                  AND ra.status IN ('pending', 'accepted', 'in_progress')
                  AND m.status NOT IN {}
                "#,
                TERMINAL_STATUSES
            ),
            reviewer_id,
        )
    }

    fn active_editor_assignment(
        &self,
        manuscript_id: ManuscriptId,
    ) -> StorageResult<Option<EditorAssignment>> {
        self.query_doc(
            "SELECT data FROM editor_assignments WHERE manuscript_id = ?1 AND active = 1 ORDER BY seq LIMIT 1",
            [manuscript_id.to_string()],
        )
    }

    fn active_editor_load(&self, editor_id: &UserId) -> StorageResult<u32> {
        self.count(
            &format!(
                r#"
                SELECT COUNT(*) FROM editor_assignments ea
                JOIN manuscripts m ON m.id = ea.manuscript_id
                WHERE ea.editor_id = ?1
                  AND ea.active = 1
                  AND m.status NOT IN {}
                "#,
                TERMINAL_STATUSES
            ),
            editor_id,
        )
    }

    fn revisions_for(&self, manuscript_id: ManuscriptId) -> StorageResult<Vec<Revision>> {
        self.query_docs(
            "SELECT data FROM revisions WHERE manuscript_id = ?1 ORDER BY version",
            [manuscript_id.to_string()],
        )
    }

    fn decisions_for(&self, manuscript_id: ManuscriptId) -> StorageResult<Vec<Decision>> {
        self.query_docs(
            "SELECT data FROM decisions WHERE manuscript_id = ?1 ORDER BY seq",
            [manuscript_id.to_string()],
        )
    }

    fn questionnaire(
        &self,
        manuscript_id: ManuscriptId,
        respondent_id: &UserId,
        role: RespondentRole,
    ) -> StorageResult<Option<ConflictQuestionnaire>> {
        self.query_doc(
            "SELECT data FROM questionnaires WHERE manuscript_id = ?1 AND respondent_id = ?2 AND role = ?3",
            params![manuscript_id.to_string(), respondent_id.as_str(), role.as_str()],
        )
    }

    fn events_for(&self, manuscript_id: ManuscriptId) -> StorageResult<Vec<Event>> {
        self.query_docs(
            "SELECT data FROM events WHERE manuscript_id = ?1 ORDER BY seq",
            [manuscript_id.to_string()],
        )
    }

    fn commit(&self, changes: ChangeSet) -> StorageResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        // Dropping the transaction on error rolls it back
        Self::apply(&tx, &changes)?;
        tx.commit()?;
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
    fn test_round_trip_manuscript_and_revision() {
        let storage = SqliteStorage::in_memory().unwrap();
        let m = manuscript();
        storage
            .commit(ChangeSet::new().manuscript(m.clone()).revision(Revision::initial(&m)))
            .unwrap();

        assert_eq!(storage.load_manuscript(m.id).unwrap(), Some(m.clone()));
        let history = storage.revisions_for(m.id).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].version, 1);
    }

    #[test]
    fn test_constraint_violation_rolls_back() {
        let storage = SqliteStorage::in_memory().unwrap();
        let m = manuscript();
        storage
            .commit(ChangeSet::new().manuscript(m.clone()).revision(Revision::initial(&m)))
            .unwrap();

        let mut moved = m.clone();
        moved.status = ManuscriptStatus::TechnicalCheck;
        let err = storage
            .commit(ChangeSet::new().manuscript(moved).revision(Revision::initial(&m)))
            .unwrap_err();

        assert!(matches!(err, StorageError::Constraint(_)));
        assert_eq!(
            storage.load_manuscript(m.id).unwrap().unwrap().status,
            ManuscriptStatus::Submitted
        );
    }

    #[test]
    fn test_assignment_upsert_keeps_order() {
        let storage = SqliteStorage::in_memory().unwrap();
        let m = manuscript();
        let mut first = ReviewAssignment::new(m.id, UserId::from("r1"), UserId::from("ed"), 1, 21);
        let second = ReviewAssignment::new(m.id, UserId::from("r2"), UserId::from("ed"), 1, 21);
        storage
            .commit(
                ChangeSet::new()
                    .manuscript(m.clone())
                    .review_assignment(first.clone())
                    .review_assignment(second.clone()),
            )
            .unwrap();

        first.respond(true).unwrap();
        storage
            .commit(ChangeSet::new().review_assignment(first.clone()))
            .unwrap();

        let all = storage.review_assignments_for(m.id).unwrap();
        assert_eq!(all, vec![first, second]);
        assert_eq!(storage.active_review_load(&UserId::from("r1")).unwrap(), 1);
    }
}
