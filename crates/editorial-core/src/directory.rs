//! Directory of journal members
//!
//! The directory is the capability collaborator: it knows who exists, which
//! roles they hold and how much concurrent work they accept. The engine
//! only reads from it.
//!
//! Rosters can be loaded from TOML:
//!
//! ```toml
//! [[members]]
//! id = "ed-ada"
//! name = "Ada Editor"
//! email = "ada@journal.example"
//! roles = ["editor"]
//! max_active_assignments = 12
//!
//! [[members]]
//! id = "rev-bob"
//! name = "Bob Reviewer"
//! roles = ["reviewer"]
//! active = false
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::ids::UserId;
use crate::role::{Actor, Role};

/// A person known to the journal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub roles: BTreeSet<Role>,
    /// Inactive members are never picked by automatic assignment
    #[serde(default = "default_active")]
    pub active: bool,
    /// Per-member override of the configured capacity limit
    #[serde(default)]
    pub max_active_assignments: Option<u32>,
}

fn default_active() -> bool {
    true
}

impl Member {
    pub fn new(id: impl Into<UserId>, name: impl Into<String>, roles: &[Role]) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: None,
            roles: roles.iter().copied().collect(),
            active: true,
            max_active_assignments: None,
        }
    }

    pub fn with_capacity(mut self, limit: u32) -> Self {
        self.max_active_assignments = Some(limit);
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// The actor context for this member
    pub fn actor(&self) -> Actor {
        Actor {
            id: self.id.clone(),
            roles: self.roles.clone(),
        }
    }
}

/// Read access to the member directory
pub trait Directory: Send + Sync {
    /// Look up a member by id
    fn lookup(&self, user_id: &UserId) -> Option<Member>;

    /// All members holding the role, ordered by id
    fn members_with_role(&self, role: Role) -> Vec<Member>;
}

/// Errors that can occur when loading a roster
#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("TOML parse error: {0}")]
    Parse(String),

    #[error("Duplicate member id: {0}")]
    DuplicateMember(String),
}

#[derive(Debug, Deserialize)]
struct RosterFile {
    #[serde(default)]
    members: Vec<Member>,
}

/// Directory held in memory
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    members: RwLock<BTreeMap<UserId, Member>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a directory from a list of members
    pub fn with_members(members: impl IntoIterator<Item = Member>) -> Self {
        let directory = Self::new();
        for member in members {
            directory.upsert(member);
        }
        directory
    }

    /// Parse a TOML roster
    pub fn from_toml_str(content: &str) -> Result<Self, RosterError> {
        let file: RosterFile =
            toml::from_str(content).map_err(|e| RosterError::Parse(e.to_string()))?;

        let mut seen = BTreeSet::new();
        for member in &file.members {
            if !seen.insert(member.id.clone()) {
                return Err(RosterError::DuplicateMember(member.id.to_string()));
            }
        }

        Ok(Self::with_members(file.members))
    }

    /// Load a TOML roster from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RosterError> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|e| RosterError::Io(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Insert or replace a member
    pub fn upsert(&self, member: Member) {
        let mut members = self
            .members
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        members.insert(member.id.clone(), member);
    }

    pub fn len(&self) -> usize {
        self.members
            .read()
            .map(|m| m.len())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Directory for InMemoryDirectory {
    fn lookup(&self, user_id: &UserId) -> Option<Member> {
        self.members
            .read()
            .ok()
            .and_then(|members| members.get(user_id).cloned())
    }

    fn members_with_role(&self, role: Role) -> Vec<Member> {
        self.members
            .read()
            .map(|members| {
                members
                    .values()
                    .filter(|m| m.has_role(role))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROSTER: &str = r#"
[[members]]
id = "ed-ada"
name = "Ada Editor"
email = "ada@journal.example"
roles = ["editor"]
max_active_assignments = 12

[[members]]
id = "rev-bob"
name = "Bob Reviewer"
roles = ["reviewer", "author"]
active = false
"#;

    #[test]
    fn test_load_roster() {
        let directory = InMemoryDirectory::from_toml_str(ROSTER).unwrap();
        assert_eq!(directory.len(), 2);

        let ada = directory.lookup(&UserId::from("ed-ada")).unwrap();
        assert!(ada.active);
        assert_eq!(ada.max_active_assignments, Some(12));

        let bob = directory.lookup(&UserId::from("rev-bob")).unwrap();
        assert!(!bob.active);
        assert!(bob.has_role(Role::Author));
    }

    #[test]
    fn test_duplicate_members_rejected() {
        let roster = r#"
[[members]]
id = "x"
name = "X"
roles = []

[[members]]
id = "x"
name = "X again"
roles = []
"#;
        assert!(matches!(
            InMemoryDirectory::from_toml_str(roster),
            Err(RosterError::DuplicateMember(_))
        ));
    }

    #[test]
    fn test_members_with_role_sorted_by_id() {
        let directory = InMemoryDirectory::with_members([
            Member::new("ed-zed", "Zed", &[Role::Editor]),
            Member::new("ed-amy", "Amy", &[Role::Editor]),
            Member::new("rev-1", "Rev", &[Role::Reviewer]),
        ]);
        let editors: Vec<_> = directory
            .members_with_role(Role::Editor)
            .into_iter()
            .map(|m| m.id.0)
            .collect();
        assert_eq!(editors, vec!["ed-amy", "ed-zed"]);
    }
}
