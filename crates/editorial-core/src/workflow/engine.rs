//! Workflow engine operations

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, error, info};

use super::{ManuscriptLocks, Outcome};
use crate::assignment::{
    AssignmentEngine, EditorAssignment, ReviewAssignment, ReviewAssignmentStatus,
};
use crate::config::EditorialConfig;
use crate::conflict::{
    evaluate_indicators, require_answers, ConflictQuestionnaire, ConflictQuestionnaireInput,
    RespondentRole,
};
use crate::decision::{Decision, DecisionKind};
use crate::directory::Directory;
use crate::error::{EditorialError, EntityKind, FieldError, Result};
use crate::event::{Event, EventPayload};
use crate::ids::{DecisionId, ManuscriptId, ReviewAssignmentId, UserId};
use crate::manuscript::{ArticleSubmission, Manuscript, ManuscriptStatus, Trigger};
use crate::persistence::{ChangeSet, Storage};
use crate::review::{Audience, ReviewAggregator, ReviewFeedback, ReviewSummary, ReviewView};
use crate::revision::{
    Revision, RevisionInput, RevisionManager, RevisionReceipt, ValidationResult,
};
use crate::role::{Actor, Capabilities};

/// Coordinates the manuscript lifecycle
pub struct WorkflowEngine {
    storage: Arc<dyn Storage>,
    directory: Arc<dyn Directory>,
    config: EditorialConfig,
    locks: ManuscriptLocks,
}

impl WorkflowEngine {
    pub fn new(
        storage: Arc<dyn Storage>,
        directory: Arc<dyn Directory>,
        config: EditorialConfig,
    ) -> Self {
        let locks = ManuscriptLocks::new(Duration::from_millis(config.locking.timeout_ms));
        Self {
            storage,
            directory,
            config,
            locks,
        }
    }

    pub fn config(&self) -> &EditorialConfig {
        &self.config
    }

    pub fn directory(&self) -> &dyn Directory {
        self.directory.as_ref()
    }

    // ==================== Submission ====================

    /// Validate and persist a new article
    ///
    /// Any validation failure is reported as `SubmissionFailed` with the
    /// field errors attached; nothing is written.
    pub fn submit_article(
        &self,
        actor: &Actor,
        submission: ArticleSubmission,
    ) -> Result<Outcome<Manuscript>> {
        actor.require(Capabilities::SUBMIT, "submit articles")?;

        let errors = submission.validate(&self.config.submission);
        if !errors.is_empty() {
            debug!(author = %actor.id, errors = errors.len(), "Submission rejected");
            return Err(EditorialError::SubmissionFailed { errors });
        }

        let manuscript = Manuscript::from_submission(actor.id.clone(), submission);
        let event = Event::new(
            manuscript.id,
            manuscript.author_id.clone(),
            actor.id.clone(),
            EventPayload::SubmissionReceived {
                title: manuscript.title.clone(),
            },
        );

        self.commit(
            ChangeSet::new()
                .manuscript(manuscript.clone())
                .revision(Revision::initial(&manuscript))
                .events([event.clone()]),
        )?;

        info!(manuscript_id = %manuscript.id, author = %actor.id, "Manuscript submitted");
        Ok(Outcome::new(manuscript, vec![event]))
    }

    /// Mark the desk check as passed
    pub fn pass_technical_check(
        &self,
        actor: &Actor,
        manuscript_id: ManuscriptId,
    ) -> Result<Outcome<Manuscript>> {
        actor.require(Capabilities::SCREEN, "run technical checks")?;
        let _guard = self.locks.acquire(manuscript_id)?;

        let mut manuscript = self.load(manuscript_id)?;
        let trigger = Trigger::PassTechnicalCheck {
            reviewers_assigned: manuscript.has_reviewers(),
        };
        let (from, to) = Self::apply_transition(&mut manuscript, trigger)?;
        manuscript.technical_check_passed_at = Some(Utc::now());

        let events = if from == to {
            Vec::new()
        } else {
            vec![Self::author_event(
                &manuscript,
                actor,
                EventPayload::TechnicalCheckPassed { status: to },
            )]
        };

        self.commit(
            ChangeSet::new()
                .manuscript(manuscript.clone())
                .events(events.clone()),
        )?;
        Self::log_transition(manuscript_id, trigger, from, to);
        Ok(Outcome::new(manuscript, events))
    }

    // ==================== Editor assignment ====================

    /// Assign a named associate editor
    pub fn assign_associate_editor(
        &self,
        actor: &Actor,
        manuscript_id: ManuscriptId,
        editor_id: &UserId,
    ) -> Result<Outcome<EditorAssignment>> {
        actor.require(Capabilities::ASSIGN_EDITOR, "assign associate editors")?;
        let _guard = self.locks.acquire(manuscript_id)?;

        let manuscript = self.load(manuscript_id)?;
        Self::ensure_open(&manuscript)?;
        self.assign_editor_locked(actor, manuscript, editor_id)
    }

    /// Assign the single eligible associate editor
    pub fn auto_assign_associate_editor(
        &self,
        actor: &Actor,
        manuscript_id: ManuscriptId,
    ) -> Result<Outcome<EditorAssignment>> {
        actor.require(Capabilities::ASSIGN_EDITOR, "assign associate editors")?;
        let _guard = self.locks.acquire(manuscript_id)?;

        let manuscript = self.load(manuscript_id)?;
        Self::ensure_open(&manuscript)?;
        if let Some(active) = self.storage.active_editor_assignment(manuscript_id)? {
            return Err(EditorialError::AlreadyAssigned {
                manuscript_id,
                editor_id: active.editor_id,
            });
        }

        let eligible = self.assignments().eligible_editors(&manuscript)?;
        let editor_id = match eligible.as_slice() {
            [] => return Err(EditorialError::NoEligibleCandidate(manuscript_id)),
            [only] => only.id.clone(),
            many => {
                return Err(EditorialError::AmbiguousAssignment {
                    candidates: many.len(),
                })
            }
        };

        self.assign_editor_locked(actor, manuscript, &editor_id)
    }

    fn assign_editor_locked(
        &self,
        actor: &Actor,
        mut manuscript: Manuscript,
        editor_id: &UserId,
    ) -> Result<Outcome<EditorAssignment>> {
        let assignment = self
            .assignments()
            .plan_editor(&manuscript, editor_id, &actor.id)?;

        manuscript.editor_id = Some(assignment.editor_id.clone());
        manuscript.touch();

        let event = Event::new(
            manuscript.id,
            assignment.editor_id.clone(),
            actor.id.clone(),
            EventPayload::EditorAssigned {
                assignment_id: assignment.id,
                editor_id: assignment.editor_id.clone(),
            },
        );

        self.commit(
            ChangeSet::new()
                .manuscript(manuscript.clone())
                .editor_assignment(assignment.clone())
                .events([event.clone()]),
        )?;

        info!(
            manuscript_id = %manuscript.id,
            editor = %assignment.editor_id,
            "Associate editor assigned"
        );
        Ok(Outcome::new(assignment, vec![event]))
    }

    /// End the active associate editor assignment
    pub fn unassign_associate_editor(
        &self,
        actor: &Actor,
        manuscript_id: ManuscriptId,
    ) -> Result<Outcome<EditorAssignment>> {
        actor.require(Capabilities::ASSIGN_EDITOR, "unassign associate editors")?;
        let _guard = self.locks.acquire(manuscript_id)?;

        let mut manuscript = self.load(manuscript_id)?;
        let mut assignment = self
            .storage
            .active_editor_assignment(manuscript_id)?
            .ok_or_else(|| EditorialError::not_found(EntityKind::EditorAssignment, manuscript_id))?;

        assignment.end();
        manuscript.editor_id = None;
        manuscript.touch();

        let event = Event::new(
            manuscript_id,
            assignment.editor_id.clone(),
            actor.id.clone(),
            EventPayload::EditorUnassigned {
                editor_id: assignment.editor_id.clone(),
            },
        );

        self.commit(
            ChangeSet::new()
                .manuscript(manuscript)
                .editor_assignment(assignment.clone())
                .events([event.clone()]),
        )?;

        info!(manuscript_id = %manuscript_id, editor = %assignment.editor_id, "Associate editor unassigned");
        Ok(Outcome::new(assignment, vec![event]))
    }

    // ==================== Reviewers ====================

    /// Invite a reviewer; the first invitation starts the review
    pub fn assign_reviewer(
        &self,
        actor: &Actor,
        manuscript_id: ManuscriptId,
        reviewer_id: &UserId,
    ) -> Result<Outcome<ReviewAssignment>> {
        actor.require(Capabilities::ASSIGN_REVIEWER, "assign reviewers")?;
        let _guard = self.locks.acquire(manuscript_id)?;

        let mut manuscript = self.load(manuscript_id)?;
        if !manuscript.status.accepts_reviewers() {
            return Err(EditorialError::InvalidTransition {
                from: manuscript.status,
                trigger: Trigger::AssignReviewer.name().to_string(),
            });
        }

        let assignment = self
            .assignments()
            .plan_reviewer(&manuscript, reviewer_id, &actor.id)?;

        let from = manuscript.status;
        if matches!(
            from,
            ManuscriptStatus::Submitted | ManuscriptStatus::TechnicalCheck
        ) {
            Self::apply_transition(&mut manuscript, Trigger::AssignReviewer)?;
        }
        manuscript.add_reviewer(assignment.reviewer_id.clone());
        manuscript.touch();

        let event = Event::new(
            manuscript_id,
            assignment.reviewer_id.clone(),
            actor.id.clone(),
            EventPayload::ReviewerInvited {
                assignment_id: assignment.id,
                reviewer_id: assignment.reviewer_id.clone(),
                due_at: assignment.due_at(),
            },
        );

        self.commit(
            ChangeSet::new()
                .manuscript(manuscript.clone())
                .review_assignment(assignment.clone())
                .events([event.clone()]),
        )?;

        Self::log_transition(manuscript_id, Trigger::AssignReviewer, from, manuscript.status);
        info!(
            manuscript_id = %manuscript_id,
            reviewer = %assignment.reviewer_id,
            due_at = %assignment.due_at(),
            "Reviewer invited"
        );
        Ok(Outcome::new(assignment, vec![event]))
    }

    /// Accept or decline a review invitation
    pub fn respond_to_review_invitation(
        &self,
        actor: &Actor,
        assignment_id: ReviewAssignmentId,
        accept: bool,
    ) -> Result<Outcome<ReviewAssignment>> {
        let (manuscript, mut assignment, _guard) =
            self.lock_review_assignment(actor, assignment_id)?;

        assignment.respond(accept)?;

        let recipient = manuscript
            .editor_id
            .clone()
            .unwrap_or_else(|| assignment.assigned_by.clone());
        let event = Event::new(
            manuscript.id,
            recipient,
            actor.id.clone(),
            EventPayload::ReviewInvitationAnswered {
                assignment_id,
                reviewer_id: assignment.reviewer_id.clone(),
                accepted: accept,
            },
        );

        self.commit(
            ChangeSet::new()
                .review_assignment(assignment.clone())
                .events([event.clone()]),
        )?;

        info!(
            manuscript_id = %manuscript.id,
            reviewer = %assignment.reviewer_id,
            accepted = accept,
            "Review invitation answered"
        );
        Ok(Outcome::new(assignment, vec![event]))
    }

    /// Mark an accepted review as being worked on
    pub fn start_review(
        &self,
        actor: &Actor,
        assignment_id: ReviewAssignmentId,
    ) -> Result<Outcome<ReviewAssignment>> {
        let (_, mut assignment, _guard) = self.lock_review_assignment(actor, assignment_id)?;

        assignment.start()?;
        self.commit(ChangeSet::new().review_assignment(assignment.clone()))?;

        debug!(assignment_id = %assignment_id, "Review started");
        Ok(Outcome::quiet(assignment))
    }

    /// Record a completed review; the manuscript status does not change
    pub fn submit_review(
        &self,
        actor: &Actor,
        assignment_id: ReviewAssignmentId,
        feedback: ReviewFeedback,
    ) -> Result<Outcome<ReviewAssignment>> {
        let (manuscript, mut assignment, _guard) =
            self.lock_review_assignment(actor, assignment_id)?;

        if assignment.status == ReviewAssignmentStatus::Completed {
            return Err(EditorialError::AlreadyCompleted(assignment_id));
        }

        let errors = feedback.validate(self.config.review.rating_scale_max);
        if !errors.is_empty() {
            return Err(EditorialError::Validation(errors));
        }

        let recommendation = feedback.recommendation;
        assignment.complete(feedback)?;

        let events: Vec<_> = Self::editor_event(
            &manuscript,
            actor,
            EventPayload::ReviewSubmitted {
                assignment_id,
                reviewer_id: assignment.reviewer_id.clone(),
                recommendation,
            },
        )
        .into_iter()
        .collect();

        self.commit(
            ChangeSet::new()
                .review_assignment(assignment.clone())
                .events(events.clone()),
        )?;

        info!(
            manuscript_id = %manuscript.id,
            reviewer = %assignment.reviewer_id,
            recommendation = %recommendation,
            "Review submitted"
        );
        Ok(Outcome::new(assignment, events))
    }

    /// Lock the assignment's manuscript and check the actor is the reviewer
    fn lock_review_assignment(
        &self,
        actor: &Actor,
        assignment_id: ReviewAssignmentId,
    ) -> Result<(Manuscript, ReviewAssignment, super::ManuscriptGuard<'_>)> {
        let manuscript_id = self.load_review_assignment(assignment_id)?.manuscript_id;
        let guard = self.locks.acquire(manuscript_id)?;

        // Re-read under the lock
        let assignment = self.load_review_assignment(assignment_id)?;
        if assignment.reviewer_id != actor.id {
            return Err(EditorialError::AccessDenied(format!(
                "{} is not the reviewer of assignment {}",
                actor.id, assignment_id
            )));
        }

        let manuscript = self.load(manuscript_id)?;
        Self::ensure_open(&manuscript)?;
        Ok((manuscript, assignment, guard))
    }

    // ==================== Decisions ====================

    /// Record an editorial decision and move the manuscript accordingly
    pub fn record_decision(
        &self,
        actor: &Actor,
        manuscript_id: ManuscriptId,
        kind: DecisionKind,
        comments: &str,
    ) -> Result<Outcome<Decision>> {
        actor.require(Capabilities::DECIDE, "record decisions")?;
        let _guard = self.locks.acquire(manuscript_id)?;

        let mut manuscript = self.load(manuscript_id)?;
        let trigger = Trigger::Decide(kind);
        let (from, to) = Self::apply_transition(&mut manuscript, trigger)?;

        let decision = Decision {
            id: DecisionId::new(),
            manuscript_id,
            editor_id: actor.id.clone(),
            kind,
            comments: comments.trim().to_string(),
            from_status: from,
            resulting_status: to,
            decided_at: Utc::now(),
        };

        let event = Self::author_event(
            &manuscript,
            actor,
            EventPayload::DecisionRecorded {
                decision_id: decision.id,
                decision: kind,
                status: to,
            },
        );

        self.commit(
            ChangeSet::new()
                .manuscript(manuscript)
                .decision(decision.clone())
                .events([event.clone()]),
        )?;

        Self::log_transition(manuscript_id, trigger, from, to);
        Ok(Outcome::new(decision, vec![event]))
    }

    // ==================== Revisions ====================

    /// Check a revision without submitting it
    pub fn validate_revision_submission(
        &self,
        actor: &Actor,
        input: &RevisionInput,
    ) -> Result<ValidationResult> {
        let manuscript = self.load(input.manuscript_id)?;
        if !manuscript.is_author(&actor.id) {
            return Err(EditorialError::NotAuthor {
                manuscript_id: manuscript.id,
                actor: actor.id.clone(),
            });
        }
        Ok(RevisionManager::new(&self.config.revision).validate(&manuscript, input))
    }

    /// Accept a new manuscript version during a revision cycle
    pub fn submit_revision(
        &self,
        actor: &Actor,
        input: RevisionInput,
    ) -> Result<Outcome<RevisionReceipt>> {
        let manuscript_id = input.manuscript_id;
        let _guard = self.locks.acquire(manuscript_id)?;

        let mut manuscript = self.load(manuscript_id)?;
        if manuscript.status != ManuscriptStatus::RevisionRequested {
            return Err(EditorialError::InvalidState {
                manuscript_id,
                message: format!(
                    "revisions are only accepted while {} (status is {})",
                    ManuscriptStatus::RevisionRequested,
                    manuscript.status
                ),
            });
        }
        if !manuscript.is_author(&actor.id) {
            return Err(EditorialError::NotAuthor {
                manuscript_id,
                actor: actor.id.clone(),
            });
        }

        let validation = RevisionManager::new(&self.config.revision).validate(&manuscript, &input);
        if !validation.is_valid {
            return Err(EditorialError::Validation(validation.errors));
        }

        let history = self.storage.revisions_for(manuscript_id)?;
        let version = RevisionManager::next_version(&manuscript, &history);
        let trigger = Trigger::SubmitRevision {
            re_review: self.config.revision.re_review.destination(),
        };
        let (from, to) = Self::apply_transition(&mut manuscript, trigger)?;

        let revision = Revision::from_input(actor.id.clone(), version, input);
        manuscript.version = version;
        manuscript.files = revision.files.clone();

        let events: Vec<_> = Self::editor_event(
            &manuscript,
            actor,
            EventPayload::RevisionSubmitted {
                revision_id: revision.id,
                version,
            },
        )
        .into_iter()
        .collect();

        self.commit(
            ChangeSet::new()
                .manuscript(manuscript)
                .revision(revision.clone())
                .events(events.clone()),
        )?;

        Self::log_transition(manuscript_id, trigger, from, to);
        let receipt = RevisionReceipt {
            revision_id: revision.id,
            version,
            status: to,
            message: format!("Revision {} received", version),
            warnings: validation.warnings,
        };
        Ok(Outcome::new(receipt, events))
    }

    /// All versions of a manuscript, ascending
    pub fn get_revision_history(
        &self,
        actor: &Actor,
        manuscript_id: ManuscriptId,
    ) -> Result<Vec<Revision>> {
        let manuscript = self.load(manuscript_id)?;
        self.require_view(actor, &manuscript)?;
        Ok(self.storage.revisions_for(manuscript_id)?)
    }

    // ==================== Reviews ====================

    /// Reviews and accepted invitations, as the actor may see them
    pub fn list_reviews(&self, actor: &Actor, manuscript_id: ManuscriptId) -> Result<Vec<ReviewView>> {
        let manuscript = self.load(manuscript_id)?;
        let audience = ReviewAggregator::audience(actor, &manuscript)?;
        let assignments = self.storage.review_assignments_for(manuscript_id)?;
        Ok(ReviewAggregator::new(&self.config.review).merge(&assignments, audience))
    }

    /// Decision-support summary, for editorial staff only
    pub fn review_summary(
        &self,
        actor: &Actor,
        manuscript_id: ManuscriptId,
    ) -> Result<ReviewSummary> {
        let manuscript = self.load(manuscript_id)?;
        if ReviewAggregator::audience(actor, &manuscript)? != Audience::Editorial {
            return Err(EditorialError::AccessDenied(format!(
                "{} may not view the review summary of {}",
                actor.id, manuscript_id
            )));
        }
        let assignments = self.storage.review_assignments_for(manuscript_id)?;
        Ok(ReviewAggregator::summarize(
            manuscript_id,
            &assignments,
            Utc::now(),
        ))
    }

    // ==================== Conflicts of interest ====================

    /// Complete a conflict questionnaire; each one can be completed once
    pub fn submit_conflict_questionnaire(
        &self,
        actor: &Actor,
        input: ConflictQuestionnaireInput,
    ) -> Result<Outcome<ConflictQuestionnaire>> {
        let manuscript_id = input.manuscript_id;
        let _guard = self.locks.acquire(manuscript_id)?;

        let manuscript = self.load(manuscript_id)?;
        if self
            .storage
            .questionnaire(manuscript_id, &actor.id, input.role)?
            .is_some()
        {
            return Err(EditorialError::DuplicateSubmission(format!(
                "{} already completed the {} questionnaire for {}",
                actor.id, input.role, manuscript_id
            )));
        }

        let indicators = require_answers(&input)?;
        let result = evaluate_indicators(&indicators);
        let questionnaire =
            ConflictQuestionnaire::complete(actor.id.clone(), &input, indicators, result);

        let events: Vec<_> = if questionnaire.has_conflicts && !manuscript.is_editor(&actor.id) {
            Self::editor_event(
                &manuscript,
                actor,
                EventPayload::ConflictDeclared {
                    respondent_id: actor.id.clone(),
                    role: questionnaire.role,
                    detail: questionnaire.conflict_summary.clone(),
                },
            )
            .into_iter()
            .collect()
        } else {
            Vec::new()
        };

        self.commit(
            ChangeSet::new()
                .questionnaire(questionnaire.clone())
                .events(events.clone()),
        )?;

        info!(
            manuscript_id = %manuscript_id,
            respondent = %actor.id,
            role = %questionnaire.role,
            has_conflicts = questionnaire.has_conflicts,
            "Conflict questionnaire completed"
        );
        Ok(Outcome::new(questionnaire, events))
    }

    /// Read a completed questionnaire
    pub fn get_conflict_questionnaire(
        &self,
        actor: &Actor,
        manuscript_id: ManuscriptId,
        respondent_id: &UserId,
        role: RespondentRole,
    ) -> Result<ConflictQuestionnaire> {
        if &actor.id != respondent_id && !actor.can(Capabilities::VIEW_REVIEWS) {
            return Err(EditorialError::AccessDenied(format!(
                "{} may not read questionnaires of {}",
                actor.id, respondent_id
            )));
        }
        self.storage
            .questionnaire(manuscript_id, respondent_id, role)?
            .ok_or_else(|| {
                EditorialError::not_found(
                    EntityKind::Questionnaire,
                    format!("{}/{}/{}", manuscript_id, respondent_id, role),
                )
            })
    }

    // ==================== Publication ====================

    /// Publish accepted manuscripts in an issue, all or nothing
    pub fn publish_issue(
        &self,
        actor: &Actor,
        issue: &str,
        manuscript_ids: &[ManuscriptId],
    ) -> Result<Outcome<Vec<Manuscript>>> {
        actor.require(Capabilities::PUBLISH, "publish issues")?;

        let issue = issue.trim();
        let mut errors = Vec::new();
        if issue.is_empty() {
            errors.push(FieldError::new("issue", "is required"));
        }
        if manuscript_ids.is_empty() {
            errors.push(FieldError::new("manuscript_ids", "at least one manuscript is required"));
        }
        if !errors.is_empty() {
            return Err(EditorialError::Validation(errors));
        }

        let guard = self.locks.acquire_all(manuscript_ids)?;

        let mut manuscripts = guard
            .ids()
            .iter()
            .map(|id| self.load(*id))
            .collect::<Result<Vec<_>>>()?;

        // Validate the whole batch before touching any of it
        for manuscript in &manuscripts {
            Trigger::PublishIssue.destination(manuscript.status)?;
        }

        let now = Utc::now();
        let mut changes = ChangeSet::new();
        let mut events = Vec::with_capacity(manuscripts.len());
        for manuscript in &mut manuscripts {
            Self::apply_transition(manuscript, Trigger::PublishIssue)?;
            manuscript.issue = Some(issue.to_string());
            manuscript.published_at = Some(now);
            events.push(Self::author_event(
                manuscript,
                actor,
                EventPayload::ManuscriptPublished {
                    issue: issue.to_string(),
                },
            ));
            changes = changes.manuscript(manuscript.clone());
        }

        self.commit(changes.events(events.clone()))?;

        for manuscript in &manuscripts {
            Self::log_transition(
                manuscript.id,
                Trigger::PublishIssue,
                ManuscriptStatus::Accepted,
                ManuscriptStatus::Published,
            );
        }
        info!(issue, manuscripts = manuscripts.len(), "Issue published");
        Ok(Outcome::new(manuscripts, events))
    }

    // ==================== Reads ====================

    pub fn get_manuscript(&self, actor: &Actor, manuscript_id: ManuscriptId) -> Result<Manuscript> {
        let manuscript = self.load(manuscript_id)?;
        self.require_view(actor, &manuscript)?;
        Ok(manuscript)
    }

    /// Audit log of a manuscript; non-editorial viewers only see events addressed to them
    pub fn manuscript_events(&self, actor: &Actor, manuscript_id: ManuscriptId) -> Result<Vec<Event>> {
        let manuscript = self.load(manuscript_id)?;
        self.require_view(actor, &manuscript)?;
        let events = self.storage.events_for(manuscript_id)?;

        if manuscript.is_editor(&actor.id) || actor.can(Capabilities::VIEW_REVIEWS) {
            Ok(events)
        } else {
            Ok(events
                .into_iter()
                .filter(|e| e.recipient_id == actor.id)
                .collect())
        }
    }

    /// Manuscripts currently in a status, oldest first
    pub fn manuscripts_in_status(
        &self,
        actor: &Actor,
        status: ManuscriptStatus,
    ) -> Result<Vec<Manuscript>> {
        actor.require(Capabilities::VIEW_REVIEWS, "list manuscripts")?;
        Ok(self.storage.manuscripts_by_status(status)?)
    }

    // ==================== Helpers ====================

    fn assignments(&self) -> AssignmentEngine<'_> {
        AssignmentEngine::new(self.storage.as_ref(), self.directory.as_ref(), &self.config)
    }

    fn load(&self, id: ManuscriptId) -> Result<Manuscript> {
        self.storage
            .load_manuscript(id)?
            .ok_or_else(|| EditorialError::not_found(EntityKind::Manuscript, id))
    }

    fn load_review_assignment(&self, id: ReviewAssignmentId) -> Result<ReviewAssignment> {
        self.storage
            .review_assignment(id)?
            .ok_or_else(|| EditorialError::not_found(EntityKind::ReviewAssignment, id))
    }

    fn commit(&self, changes: ChangeSet) -> Result<()> {
        self.storage.commit(changes).map_err(|e| {
            error!(error = %e, "Failed to commit editorial changes");
            EditorialError::from(e)
        })
    }

    fn apply_transition(
        manuscript: &mut Manuscript,
        trigger: Trigger,
    ) -> Result<(ManuscriptStatus, ManuscriptStatus)> {
        let from = manuscript.status;
        let to = trigger.destination(from)?;
        manuscript.transition_to(to)?;
        Ok((from, to))
    }

    fn log_transition(
        manuscript_id: ManuscriptId,
        trigger: Trigger,
        from: ManuscriptStatus,
        to: ManuscriptStatus,
    ) {
        if from != to {
            info!(
                manuscript_id = %manuscript_id,
                from = %from,
                to = %to,
                trigger = trigger.name(),
                "Manuscript status changed"
            );
        }
    }

    fn ensure_open(manuscript: &Manuscript) -> Result<()> {
        if manuscript.status.is_terminal() {
            return Err(EditorialError::InvalidState {
                manuscript_id: manuscript.id,
                message: format!("manuscript is {}", manuscript.status),
            });
        }
        Ok(())
    }

    /// Reviewers keep access through any invitation they have not declined
    fn require_view(&self, actor: &Actor, manuscript: &Manuscript) -> Result<()> {
        let allowed = manuscript.is_author(&actor.id)
            || manuscript.is_editor(&actor.id)
            || actor.can(Capabilities::VIEW_REVIEWS)
            || (manuscript.reviewer_ids.contains(&actor.id)
                && self
                    .storage
                    .review_assignments_for(manuscript.id)?
                    .iter()
                    .any(|a| {
                        a.reviewer_id == actor.id && a.status != ReviewAssignmentStatus::Declined
                    }));
        if allowed {
            Ok(())
        } else {
            Err(EditorialError::AccessDenied(format!(
                "{} may not view manuscript {}",
                actor.id, manuscript.id
            )))
        }
    }

    fn author_event(manuscript: &Manuscript, actor: &Actor, payload: EventPayload) -> Event {
        Event::new(
            manuscript.id,
            manuscript.author_id.clone(),
            actor.id.clone(),
            payload,
        )
    }

    fn editor_event(manuscript: &Manuscript, actor: &Actor, payload: EventPayload) -> Option<Event> {
        manuscript
            .editor_id
            .clone()
            .map(|editor| Event::new(manuscript.id, editor, actor.id.clone(), payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{InMemoryDirectory, Member};
    use crate::error::ErrorKind;
    use crate::manuscript::ManuscriptFile;
    use crate::persistence::InMemoryStorage;
    use crate::review::Recommendation;
    use crate::role::Role;

    struct Harness {
        storage: Arc<InMemoryStorage>,
        engine: WorkflowEngine,
    }

    fn harness() -> Harness {
        let storage = Arc::new(InMemoryStorage::new());
        let directory = Arc::new(InMemoryDirectory::with_members([
            Member::new("author-1", "Ana", &[Role::Author]),
            Member::new("eic", "Eve", &[Role::EditorInChief]),
            Member::new("ed-1", "Ed", &[Role::Editor]),
            Member::new("rev-1", "R1", &[Role::Reviewer]),
            Member::new("rev-2", "R2", &[Role::Reviewer]),
        ]));
        let engine = WorkflowEngine::new(
            storage.clone(),
            directory,
            EditorialConfig::default(),
        );
        Harness { storage, engine }
    }

    fn author() -> Actor {
        Actor::new("author-1", [Role::Author])
    }

    fn eic() -> Actor {
        Actor::new("eic", [Role::EditorInChief])
    }

    fn reviewer(id: &str) -> Actor {
        Actor::new(id, [Role::Reviewer])
    }

    fn submit(h: &Harness) -> Manuscript {
        h.engine
            .submit_article(&author(), ArticleSubmission::sample_valid())
            .unwrap()
            .value
    }

    fn under_review(h: &Harness) -> (Manuscript, ReviewAssignment) {
        let m = submit(h);
        let a = h
            .engine
            .assign_reviewer(&eic(), m.id, &UserId::from("rev-1"))
            .unwrap()
            .value;
        (h.engine.get_manuscript(&eic(), m.id).unwrap(), a)
    }

    fn feedback(rec: Recommendation) -> ReviewFeedback {
        ReviewFeedback {
            recommendation: rec,
            rating: 4.0,
            scores: None,
            comments_to_author: "Well argued.".to_string(),
            confidential_comments: Some("Minor concerns on priors".to_string()),
        }
    }

    fn revision(m: &Manuscript) -> RevisionInput {
        RevisionInput {
            manuscript_id: m.id,
            response_to_reviewers: "We addressed every comment; see the marked-up PDF.".to_string(),
            change_summary: Some("New section 4".to_string()),
            files: vec![ManuscriptFile {
                name: "main-v2.pdf".to_string(),
                kind: "manuscript".to_string(),
                size_bytes: 140_000,
            }],
            expected_version: None,
        }
    }

    #[test]
    fn test_submit_records_first_version_and_event() {
        let h = harness();
        let outcome = h
            .engine
            .submit_article(&author(), ArticleSubmission::sample_valid())
            .unwrap();

        assert_eq!(outcome.value.status, ManuscriptStatus::Submitted);
        assert_eq!(outcome.events.len(), 1);
        assert_eq!(outcome.events[0].kind(), "submission_received");

        let history = h.engine.get_revision_history(&author(), outcome.value.id).unwrap();
        assert_eq!(history.iter().map(|r| r.version).collect::<Vec<_>>(), vec![1]);
        assert_eq!(h.storage.events_for(outcome.value.id).unwrap().len(), 1);
    }

    #[test]
    fn test_reviewer_cannot_submit_articles() {
        let h = harness();
        let err = h
            .engine
            .submit_article(&reviewer("rev-1"), ArticleSubmission::sample_valid())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
    }

    #[test]
    fn test_technical_check_without_reviewers() {
        let h = harness();
        let m = submit(&h);

        let first = h.engine.pass_technical_check(&eic(), m.id).unwrap();
        assert_eq!(first.value.status, ManuscriptStatus::TechnicalCheck);
        assert_eq!(first.events.len(), 1);

        let again = h.engine.pass_technical_check(&eic(), m.id).unwrap();
        assert_eq!(again.value.status, ManuscriptStatus::TechnicalCheck);
        assert!(again.events.is_empty());
    }

    #[test]
    fn test_reject_from_technical_check() {
        let h = harness();
        let m = submit(&h);
        h.engine.pass_technical_check(&eic(), m.id).unwrap();
        let decision = h
            .engine
            .record_decision(&eic(), m.id, DecisionKind::Reject, "Out of scope")
            .unwrap();
        assert_eq!(decision.value.resulting_status, ManuscriptStatus::Rejected);
        assert_eq!(decision.events.len(), 1);
        assert_eq!(decision.events[0].recipient_id, UserId::from("author-1"));
    }

    #[test]
    fn test_editor_assignment_lifecycle() {
        let h = harness();
        let m = submit(&h);

        h.engine
            .assign_associate_editor(&eic(), m.id, &UserId::from("ed-1"))
            .unwrap();
        assert!(matches!(
            h.engine.assign_associate_editor(&eic(), m.id, &UserId::from("ed-1")),
            Err(EditorialError::AlreadyAssigned { .. })
        ));

        let ended = h.engine.unassign_associate_editor(&eic(), m.id).unwrap();
        assert!(!ended.value.is_active());
        assert!(h.engine.get_manuscript(&eic(), m.id).unwrap().editor_id.is_none());

        // Only ed-1 holds the editor role, so auto-assignment is unambiguous
        let auto = h.engine.auto_assign_associate_editor(&eic(), m.id).unwrap();
        assert_eq!(auto.value.editor_id, UserId::from("ed-1"));
    }

    #[test]
    fn test_editor_cannot_assign_editors() {
        let h = harness();
        let m = submit(&h);
        let editor = Actor::new("ed-1", [Role::Editor]);
        assert!(matches!(
            h.engine.assign_associate_editor(&editor, m.id, &UserId::from("ed-1")),
            Err(EditorialError::AccessDenied(_))
        ));
    }

    #[test]
    fn test_review_flow_and_listing() {
        let h = harness();
        let (m, a) = under_review(&h);
        assert_eq!(m.status, ManuscriptStatus::UnderReview);

        // Someone else cannot answer rev-1's invitation
        assert!(matches!(
            h.engine.respond_to_review_invitation(&reviewer("rev-2"), a.id, true),
            Err(EditorialError::AccessDenied(_))
        ));

        h.engine
            .respond_to_review_invitation(&reviewer("rev-1"), a.id, true)
            .unwrap();
        h.engine.start_review(&reviewer("rev-1"), a.id).unwrap();
        let done = h
            .engine
            .submit_review(&reviewer("rev-1"), a.id, feedback(Recommendation::MinorRevision))
            .unwrap();
        assert_eq!(done.value.status, ReviewAssignmentStatus::Completed);
        // No editor assigned, nobody to notify
        assert!(done.events.is_empty());

        assert!(matches!(
            h.engine
                .submit_review(&reviewer("rev-1"), a.id, feedback(Recommendation::Accept)),
            Err(EditorialError::AlreadyCompleted(id)) if id == a.id
        ));

        // Status is untouched by reviews
        assert_eq!(
            h.engine.get_manuscript(&eic(), m.id).unwrap().status,
            ManuscriptStatus::UnderReview
        );

        let author_view = h.engine.list_reviews(&author(), m.id).unwrap();
        assert_eq!(author_view.len(), 1);
        assert!(author_view[0].confidential_comments.is_none());

        let editorial_view = h.engine.list_reviews(&eic(), m.id).unwrap();
        assert!(editorial_view[0].confidential_comments.is_some());

        assert!(matches!(
            h.engine.list_reviews(&reviewer("rev-2"), m.id),
            Err(EditorialError::AccessDenied(_))
        ));

        let summary = h.engine.review_summary(&eic(), m.id).unwrap();
        assert_eq!(summary.consensus, Some(Recommendation::MinorRevision));
        assert!(h.engine.review_summary(&author(), m.id).is_err());
    }

    #[test]
    fn test_rating_outside_scale_rejected() {
        let h = harness();
        let (_, a) = under_review(&h);
        let mut fb = feedback(Recommendation::Accept);
        fb.rating = 7.0;
        assert!(matches!(
            h.engine.submit_review(&reviewer("rev-1"), a.id, fb),
            Err(EditorialError::Validation(_))
        ));
    }

    #[test]
    fn test_revision_only_by_author_while_requested() {
        let h = harness();
        let (m, _) = under_review(&h);

        assert!(matches!(
            h.engine.submit_revision(&author(), revision(&m)),
            Err(EditorialError::InvalidState { .. })
        ));

        h.engine
            .record_decision(&eic(), m.id, DecisionKind::MinorRevision, "Please clarify")
            .unwrap();

        assert!(matches!(
            h.engine.submit_revision(&eic(), revision(&m)),
            Err(EditorialError::NotAuthor { .. })
        ));

        let receipt = h.engine.submit_revision(&author(), revision(&m)).unwrap().value;
        assert_eq!(receipt.version, 2);
        assert_eq!(receipt.status, ManuscriptStatus::UnderReview);
        assert_eq!(receipt.warnings.len(), 1);
    }

    #[test]
    fn test_conflict_declaration_blocks_reviewer() {
        let h = harness();
        let m = submit(&h);
        let input = ConflictQuestionnaireInput {
            manuscript_id: m.id,
            role: RespondentRole::Reviewer,
            has_affiliation: Some(true),
            has_collaboration: Some(false),
            has_financial_interests: Some(false),
            has_personal_relationship: Some(false),
            has_institutional_conflict: Some(false),
            can_review_objectively: Some(true),
            details: Some("Same department".to_string()),
        };
        let q = h
            .engine
            .submit_conflict_questionnaire(&reviewer("rev-2"), input)
            .unwrap()
            .value;
        assert!(q.has_conflicts);

        assert!(matches!(
            h.engine.assign_reviewer(&eic(), m.id, &UserId::from("rev-2")),
            Err(EditorialError::ConflictOfInterest { .. })
        ));

        let read = h
            .engine
            .get_conflict_questionnaire(&eic(), m.id, &UserId::from("rev-2"), RespondentRole::Reviewer)
            .unwrap();
        assert_eq!(read, q);
        assert!(h
            .engine
            .get_conflict_questionnaire(&reviewer("rev-1"), m.id, &UserId::from("rev-2"), RespondentRole::Reviewer)
            .is_err());
    }

    #[test]
    fn test_publish_issue_is_all_or_nothing() {
        let h = harness();
        let (accepted, _) = under_review(&h);
        h.engine
            .record_decision(&eic(), accepted.id, DecisionKind::Accept, "")
            .unwrap();
        let still_submitted = submit(&h);

        let err = h
            .engine
            .publish_issue(&eic(), "vol-1-issue-1", &[accepted.id, still_submitted.id])
            .unwrap_err();
        assert!(matches!(err, EditorialError::InvalidTransition { .. }));
        assert_eq!(
            h.engine.get_manuscript(&eic(), accepted.id).unwrap().status,
            ManuscriptStatus::Accepted
        );

        let published = h
            .engine
            .publish_issue(&eic(), "vol-1-issue-1", &[accepted.id])
            .unwrap();
        assert_eq!(published.value[0].status, ManuscriptStatus::Published);
        assert_eq!(published.value[0].issue.as_deref(), Some("vol-1-issue-1"));
        assert_eq!(published.events[0].kind(), "manuscript_published");
    }

    #[test]
    fn test_storage_failure_is_fatal() {
        let h = harness();
        let m = submit(&h);
        h.storage.set_unavailable(true);
        let err = h.engine.pass_technical_check(&eic(), m.id).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_author_sees_only_own_events() {
        let h = harness();
        let (m, _) = under_review(&h);
        let author_events = h.engine.manuscript_events(&author(), m.id).unwrap();
        assert!(author_events
            .iter()
            .all(|e| e.recipient_id == UserId::from("author-1")));
        let all = h.engine.manuscript_events(&eic(), m.id).unwrap();
        assert_eq!(all.len(), 2);
    }
}
