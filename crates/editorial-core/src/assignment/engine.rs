//! Eligibility, conflict and capacity checks for assignments
//!
//! The engine only plans assignments. The workflow engine calls it while
//! holding the manuscript lock and commits what it returns, so the
//! duplicate check and the insert cannot interleave with another call.

use tracing::warn;

use super::{EditorAssignment, ReviewAssignment};
use crate::config::{CapacityPolicy, EditorialConfig};
use crate::conflict::RespondentRole;
use crate::directory::{Directory, Member};
use crate::error::{EditorialError, EntityKind, Result};
use crate::ids::UserId;
use crate::manuscript::Manuscript;
use crate::persistence::Storage;
use crate::role::{Capabilities, Role};

/// Plans editor and reviewer assignments
pub struct AssignmentEngine<'a> {
    storage: &'a dyn Storage,
    directory: &'a dyn Directory,
    config: &'a EditorialConfig,
}

impl<'a> AssignmentEngine<'a> {
    pub fn new(
        storage: &'a dyn Storage,
        directory: &'a dyn Directory,
        config: &'a EditorialConfig,
    ) -> Self {
        Self {
            storage,
            directory,
            config,
        }
    }

    /// Validate an explicit associate editor and build the assignment
    pub fn plan_editor(
        &self,
        manuscript: &Manuscript,
        editor_id: &UserId,
        assigned_by: &UserId,
    ) -> Result<EditorAssignment> {
        if let Some(active) = self.storage.active_editor_assignment(manuscript.id)? {
            return Err(EditorialError::AlreadyAssigned {
                manuscript_id: manuscript.id,
                editor_id: active.editor_id,
            });
        }

        let member = self.member(editor_id)?;
        if !member.actor().can(Capabilities::DECIDE) {
            return Err(EditorialError::Role {
                user_id: editor_id.clone(),
                required: Role::Editor,
            });
        }

        self.check_conflicts(manuscript, &member.id, RespondentRole::AssociateEditor)?;

        let load = self.storage.active_editor_load(&member.id)?;
        self.check_capacity(
            &member,
            load,
            self.config.capacity.max_active_editor_assignments,
        )?;

        Ok(EditorAssignment::new(
            manuscript.id,
            member.id,
            assigned_by.clone(),
        ))
    }

    /// Editors who could take the manuscript, ordered by id
    ///
    /// Capacity is a hard filter here regardless of policy: automatic
    /// assignment never picks someone who is already full.
    pub fn eligible_editors(&self, manuscript: &Manuscript) -> Result<Vec<Member>> {
        let mut eligible = Vec::new();
        for member in self.directory.members_with_role(Role::Editor) {
            if !member.active {
                continue;
            }
            if self
                .check_conflicts(manuscript, &member.id, RespondentRole::AssociateEditor)
                .is_err()
            {
                continue;
            }
            let load = self.storage.active_editor_load(&member.id)?;
            let limit = member
                .max_active_assignments
                .unwrap_or(self.config.capacity.max_active_editor_assignments);
            if load >= limit {
                continue;
            }
            eligible.push(member);
        }
        Ok(eligible)
    }

    /// Validate a reviewer and build a pending assignment
    pub fn plan_reviewer(
        &self,
        manuscript: &Manuscript,
        reviewer_id: &UserId,
        assigned_by: &UserId,
    ) -> Result<ReviewAssignment> {
        let existing = self.storage.review_assignments_for(manuscript.id)?;
        if existing
            .iter()
            .any(|a| &a.reviewer_id == reviewer_id && a.is_active())
        {
            return Err(EditorialError::DuplicateAssignment {
                manuscript_id: manuscript.id,
                reviewer_id: reviewer_id.clone(),
            });
        }

        let member = self.member(reviewer_id)?;
        if !member.actor().can(Capabilities::REVIEW) {
            return Err(EditorialError::Role {
                user_id: reviewer_id.clone(),
                required: Role::Reviewer,
            });
        }

        self.check_conflicts(manuscript, &member.id, RespondentRole::Reviewer)?;

        let load = self.storage.active_review_load(&member.id)?;
        self.check_capacity(&member, load, self.config.capacity.max_active_reviews)?;

        Ok(ReviewAssignment::new(
            manuscript.id,
            member.id,
            assigned_by.clone(),
            manuscript.version,
            self.config.review.review_window_days,
        ))
    }

    fn member(&self, user_id: &UserId) -> Result<Member> {
        self.directory
            .lookup(user_id)
            .ok_or_else(|| EditorialError::not_found(EntityKind::User, user_id))
    }

    /// Authors never handle their own manuscript; a conflicted questionnaire blocks too
    fn check_conflicts(
        &self,
        manuscript: &Manuscript,
        user_id: &UserId,
        role: RespondentRole,
    ) -> Result<()> {
        if manuscript.is_author(user_id) {
            return Err(EditorialError::ConflictOfInterest {
                user_id: user_id.clone(),
                detail: "author of the manuscript".to_string(),
            });
        }

        if let Some(questionnaire) = self.storage.questionnaire(manuscript.id, user_id, role)? {
            if questionnaire.has_conflicts {
                let detail = if questionnaire.conflict_summary.is_empty() {
                    "cannot review objectively".to_string()
                } else {
                    questionnaire.conflict_summary
                };
                return Err(EditorialError::ConflictOfInterest {
                    user_id: user_id.clone(),
                    detail,
                });
            }
        }

        Ok(())
    }

    fn check_capacity(&self, member: &Member, active: u32, default_limit: u32) -> Result<()> {
        let limit = member.max_active_assignments.unwrap_or(default_limit);
        if active < limit {
            return Ok(());
        }

        match self.config.capacity.policy {
            CapacityPolicy::Enforce => Err(EditorialError::CapacityExceeded {
                user_id: member.id.clone(),
                active,
                limit,
            }),
            CapacityPolicy::Warn => {
                warn!(
                    user_id = %member.id,
                    active,
                    limit,
                    "Assignment exceeds capacity, proceeding"
                );
                Ok(())
            }
        }
    }
}
