//! Roles, capabilities and the acting user
//!
//! Every engine operation receives an explicit [`Actor`]. Permission checks
//! go through the capability set derived from the actor's roles, never
//! through role-name comparisons.

use std::collections::BTreeSet;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::error::{EditorialError, Result};
use crate::ids::UserId;

/// Closed set of journal roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Author,
    Reviewer,
    /// Associate/section editor handling individual manuscripts
    Editor,
    EditorInChief,
    ManagingEditor,
    EditorialAssistant,
    Admin,
}

bitflags! {
    /// What a holder of a role is allowed to do.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Capabilities: u32 {
        /// Submit manuscripts and revisions
        const SUBMIT = 0b0000_0000_0001;
        /// Run the technical (desk) check
        const SCREEN = 0b0000_0000_0010;
        /// Assign associate editors
        const ASSIGN_EDITOR = 0b0000_0000_0100;
        /// Invite reviewers
        const ASSIGN_REVIEWER = 0b0000_0000_1000;
        /// Write reviews
        const REVIEW = 0b0000_0001_0000;
        /// Record editorial decisions
        const DECIDE = 0b0000_0010_0000;
        /// Publish issues
        const PUBLISH = 0b0000_0100_0000;
        /// Read any manuscript's reviews and questionnaires
        const VIEW_REVIEWS = 0b0000_1000_0000;
        /// Full administrative access
        const ADMIN = 0b0001_0000_0000;
    }
}

impl Role {
    /// All roles, in declaration order
    pub const ALL: [Role; 7] = [
        Role::Author,
        Role::Reviewer,
        Role::Editor,
        Role::EditorInChief,
        Role::ManagingEditor,
        Role::EditorialAssistant,
        Role::Admin,
    ];

    /// Capabilities granted by this role
    pub fn capabilities(&self) -> Capabilities {
        match self {
            Role::Author => Capabilities::SUBMIT,
            Role::Reviewer => Capabilities::REVIEW,
            Role::Editor => {
                Capabilities::ASSIGN_REVIEWER | Capabilities::DECIDE | Capabilities::VIEW_REVIEWS
            }
            Role::EditorInChief | Role::ManagingEditor => {
                Capabilities::SCREEN
                    | Capabilities::ASSIGN_EDITOR
                    | Capabilities::ASSIGN_REVIEWER
                    | Capabilities::DECIDE
                    | Capabilities::PUBLISH
                    | Capabilities::VIEW_REVIEWS
            }
            Role::EditorialAssistant => {
                Capabilities::SCREEN | Capabilities::ASSIGN_REVIEWER | Capabilities::VIEW_REVIEWS
            }
            Role::Admin => Capabilities::all(),
        }
    }

    /// Parse the kebab-case role name used in rosters and headers
    pub fn parse(s: &str) -> Option<Role> {
        Role::ALL.into_iter().find(|r| r.as_str() == s)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Author => "author",
            Role::Reviewer => "reviewer",
            Role::Editor => "editor",
            Role::EditorInChief => "editor-in-chief",
            Role::ManagingEditor => "managing-editor",
            Role::EditorialAssistant => "editorial-assistant",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Union of the capabilities of every role in the set
pub fn capabilities_of<'a>(roles: impl IntoIterator<Item = &'a Role>) -> Capabilities {
    roles
        .into_iter()
        .fold(Capabilities::empty(), |acc, role| acc | role.capabilities())
}

/// The user performing an operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: UserId,
    pub roles: BTreeSet<Role>,
}

impl Actor {
    pub fn new(id: impl Into<UserId>, roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            id: id.into(),
            roles: roles.into_iter().collect(),
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        capabilities_of(&self.roles)
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Check a capability; admins pass every check
    pub fn can(&self, capability: Capabilities) -> bool {
        let caps = self.capabilities();
        caps.contains(Capabilities::ADMIN) || caps.contains(capability)
    }

    /// Fail with `AccessDenied` unless the actor holds the capability
    pub fn require(&self, capability: Capabilities, action: &str) -> Result<()> {
        if self.can(capability) {
            Ok(())
        } else {
            Err(EditorialError::AccessDenied(format!(
                "{} may not {}",
                self.id, action
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_author_capabilities() {
        let caps = Role::Author.capabilities();
        assert!(caps.contains(Capabilities::SUBMIT));
        assert!(!caps.contains(Capabilities::DECIDE));
        assert!(!caps.contains(Capabilities::VIEW_REVIEWS));
    }

    #[test]
    fn test_editor_can_decide_but_not_publish() {
        let actor = Actor::new("ed-1", [Role::Editor]);
        assert!(actor.can(Capabilities::DECIDE));
        assert!(actor.can(Capabilities::ASSIGN_REVIEWER));
        assert!(!actor.can(Capabilities::PUBLISH));
        assert!(!actor.can(Capabilities::ASSIGN_EDITOR));
    }

    #[test]
    fn test_admin_passes_everything() {
        let actor = Actor::new("root", [Role::Admin]);
        assert!(actor.can(Capabilities::PUBLISH));
        assert!(actor.can(Capabilities::REVIEW));
        assert!(actor.require(Capabilities::SCREEN, "screen").is_ok());
    }

    #[test]
    fn test_multiple_roles_union() {
        let actor = Actor::new("u", [Role::Author, Role::Reviewer]);
        assert!(actor.can(Capabilities::SUBMIT));
        assert!(actor.can(Capabilities::REVIEW));
        assert!(actor.require(Capabilities::DECIDE, "decide").is_err());
    }

    #[test]
    fn test_role_names_round_trip() {
        for role in Role::ALL {
            assert_eq!(Role::parse(role.as_str()), Some(role));
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{}\"", role.as_str()));
        }
        assert_eq!(Role::parse("superuser"), None);
    }
}
