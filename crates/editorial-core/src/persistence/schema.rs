//! SQLite schema for editorial state

/// Schema version for migrations
pub const SCHEMA_VERSION: u32 = 1;

/// SQLite schema definition
pub struct Schema;

impl Schema {
    /// Get the complete schema SQL
    ///
    /// Records are stored as JSON documents next to the columns the
    /// queries filter on.
    pub fn create_tables() -> &'static str {
        r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS manuscripts (
    id TEXT PRIMARY KEY,
    status TEXT NOT NULL,
    author_id TEXT NOT NULL,
    submitted_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    data TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_manuscripts_status ON manuscripts(status);
CREATE INDEX IF NOT EXISTS idx_manuscripts_author ON manuscripts(author_id);

CREATE TABLE IF NOT EXISTS review_assignments (
    id TEXT PRIMARY KEY,
    seq INTEGER NOT NULL,
    manuscript_id TEXT NOT NULL,
    reviewer_id TEXT NOT NULL,
    status TEXT NOT NULL,
    data TEXT NOT NULL,
    FOREIGN KEY (manuscript_id) REFERENCES manuscripts(id)
);

CREATE INDEX IF NOT EXISTS idx_review_assignments_manuscript ON review_assignments(manuscript_id, seq);
CREATE INDEX IF NOT EXISTS idx_review_assignments_reviewer ON review_assignments(reviewer_id, status);

CREATE TABLE IF NOT EXISTS editor_assignments (
    id TEXT PRIMARY KEY,
    seq INTEGER NOT NULL,
    manuscript_id TEXT NOT NULL,
    editor_id TEXT NOT NULL,
    active INTEGER NOT NULL,
    data TEXT NOT NULL,
    FOREIGN KEY (manuscript_id) REFERENCES manuscripts(id)
);

CREATE INDEX IF NOT EXISTS idx_editor_assignments_manuscript ON editor_assignments(manuscript_id, active);
CREATE INDEX IF NOT EXISTS idx_editor_assignments_editor ON editor_assignments(editor_id, active);

CREATE TABLE IF NOT EXISTS revisions (
    id TEXT PRIMARY KEY,
    manuscript_id TEXT NOT NULL,
    version INTEGER NOT NULL,
    data TEXT NOT NULL,
    UNIQUE (manuscript_id, version),
    FOREIGN KEY (manuscript_id) REFERENCES manuscripts(id)
);

CREATE TABLE IF NOT EXISTS decisions (
    id TEXT PRIMARY KEY,
    seq INTEGER NOT NULL,
    manuscript_id TEXT NOT NULL,
    data TEXT NOT NULL,
    FOREIGN KEY (manuscript_id) REFERENCES manuscripts(id)
);

CREATE INDEX IF NOT EXISTS idx_decisions_manuscript ON decisions(manuscript_id, seq);

CREATE TABLE IF NOT EXISTS questionnaires (
    id TEXT PRIMARY KEY,
    manuscript_id TEXT NOT NULL,
    respondent_id TEXT NOT NULL,
    role TEXT NOT NULL,
    data TEXT NOT NULL,
    UNIQUE (manuscript_id, respondent_id, role),
    FOREIGN KEY (manuscript_id) REFERENCES manuscripts(id)
);

-- Audit log (append-only)
CREATE TABLE IF NOT EXISTS events (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE,
    manuscript_id TEXT NOT NULL,
    recipient_id TEXT NOT NULL,
    kind TEXT NOT NULL,
    timestamp TEXT NOT NULL,
    data TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_events_manuscript ON events(manuscript_id, seq);
"#
    }

    /// Get migration SQL for a specific version
    pub fn migration(from_version: u32, to_version: u32) -> Option<&'static str> {
        match (from_version, to_version) {
            _ => None,
        }
    }
}
