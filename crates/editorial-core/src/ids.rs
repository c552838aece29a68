//! Identifier newtypes
//!
//! Records created by the engine get random UUID identifiers. People are
//! identified by the opaque string ids the directory hands out.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EditorialError, EntityKind, Result};

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident, $kind:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new random ID
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Create an ID from a UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Parse an ID from its string form
            pub fn parse(s: &str) -> Result<Self> {
                Uuid::parse_str(s).map(Self).map_err(|_| EditorialError::NotFound {
                    entity: $kind,
                    id: s.to_string(),
                })
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id!(
    /// Unique identifier for a manuscript
    ManuscriptId,
    EntityKind::Manuscript
);
uuid_id!(
    /// Unique identifier for a review assignment
    ReviewAssignmentId,
    EntityKind::ReviewAssignment
);
uuid_id!(
    /// Unique identifier for an editor assignment
    EditorAssignmentId,
    EntityKind::EditorAssignment
);
uuid_id!(
    /// Unique identifier for a revision
    RevisionId,
    EntityKind::Revision
);
uuid_id!(
    /// Unique identifier for a decision
    DecisionId,
    EntityKind::Decision
);
uuid_id!(
    /// Unique identifier for a conflict questionnaire
    QuestionnaireId,
    EntityKind::Questionnaire
);
uuid_id!(
    /// Unique identifier for an event
    EventId,
    EntityKind::Event
);

/// Identity of a person known to the directory (author, reviewer, editor...)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_display() {
        let id = ManuscriptId::new();
        assert_eq!(ManuscriptId::parse(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn test_parse_garbage_is_not_found() {
        let err = ReviewAssignmentId::parse("not-a-uuid").unwrap_err();
        assert!(matches!(
            err,
            EditorialError::NotFound {
                entity: EntityKind::ReviewAssignment,
                ..
            }
        ));
    }

    #[test]
    fn test_user_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&UserId::from("r-1")).unwrap();
        assert_eq!(json, "\"r-1\"");
    }
}
