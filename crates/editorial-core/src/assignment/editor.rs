//! Associate editor assignments

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{EditorAssignmentId, ManuscriptId, UserId};

/// An associate editor handling a manuscript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorAssignment {
    pub id: EditorAssignmentId,
    pub manuscript_id: ManuscriptId,
    pub editor_id: UserId,
    pub assigned_by: UserId,
    pub assigned_at: DateTime<Utc>,
    /// Set when the editor is unassigned; `None` while active
    pub unassigned_at: Option<DateTime<Utc>>,
}

impl EditorAssignment {
    pub fn new(manuscript_id: ManuscriptId, editor_id: UserId, assigned_by: UserId) -> Self {
        Self {
            id: EditorAssignmentId::new(),
            manuscript_id,
            editor_id,
            assigned_by,
            assigned_at: Utc::now(),
            unassigned_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.unassigned_at.is_none()
    }

    pub fn end(&mut self) {
        if self.unassigned_at.is_none() {
            self.unassigned_at = Some(Utc::now());
        }
    }
}
