//! Review assignments

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EditorialError, Result};
use crate::ids::{ManuscriptId, ReviewAssignmentId, UserId};
use crate::review::ReviewFeedback;

/// Lifecycle of a review invitation
///
/// ```text
/// pending → accepted → in_progress → completed
///    │         └──────────────────────↗
///    └→ declined
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAssignmentStatus {
    Pending,
    Accepted,
    InProgress,
    Completed,
    Declined,
}

impl ReviewAssignmentStatus {
    /// Active assignments count against capacity and block re-invitation
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            ReviewAssignmentStatus::Pending
                | ReviewAssignmentStatus::Accepted
                | ReviewAssignmentStatus::InProgress
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewAssignmentStatus::Pending => "pending",
            ReviewAssignmentStatus::Accepted => "accepted",
            ReviewAssignmentStatus::InProgress => "in_progress",
            ReviewAssignmentStatus::Completed => "completed",
            ReviewAssignmentStatus::Declined => "declined",
        }
    }
}

impl std::fmt::Display for ReviewAssignmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reviewer's invitation to review one manuscript version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewAssignment {
    pub id: ReviewAssignmentId,
    pub manuscript_id: ManuscriptId,
    pub reviewer_id: UserId,
    pub assigned_by: UserId,
    pub status: ReviewAssignmentStatus,
    /// Manuscript version the review was requested for
    pub round: u32,
    pub review_window_days: u32,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
    pub feedback: Option<ReviewFeedback>,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl ReviewAssignment {
    pub fn new(
        manuscript_id: ManuscriptId,
        reviewer_id: UserId,
        assigned_by: UserId,
        round: u32,
        review_window_days: u32,
    ) -> Self {
        Self {
            id: ReviewAssignmentId::new(),
            manuscript_id,
            reviewer_id,
            assigned_by,
            status: ReviewAssignmentStatus::Pending,
            round,
            review_window_days,
            created_at: Utc::now(),
            responded_at: None,
            feedback: None,
            submitted_at: None,
        }
    }

    /// Due date, always derived from the creation time
    pub fn due_at(&self) -> DateTime<Utc> {
        self.created_at + Duration::days(i64::from(self.review_window_days))
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.is_active() && now > self.due_at()
    }

    /// Accept or decline a pending invitation
    pub fn respond(&mut self, accept: bool) -> Result<()> {
        if self.status != ReviewAssignmentStatus::Pending {
            return Err(self.invalid_state(format!(
                "invitation already answered ({})",
                self.status
            )));
        }
        self.status = if accept {
            ReviewAssignmentStatus::Accepted
        } else {
            ReviewAssignmentStatus::Declined
        };
        self.responded_at = Some(Utc::now());
        Ok(())
    }

    /// Mark an accepted invitation as being worked on
    pub fn start(&mut self) -> Result<()> {
        match self.status {
            ReviewAssignmentStatus::Accepted => {
                self.status = ReviewAssignmentStatus::InProgress;
                Ok(())
            }
            ReviewAssignmentStatus::InProgress => Ok(()),
            ReviewAssignmentStatus::Completed => Err(EditorialError::AlreadyCompleted(self.id)),
            other => Err(self.invalid_state(format!("cannot start a review that is {}", other))),
        }
    }

    /// Record the review; a pending invitation is implicitly accepted
    pub fn complete(&mut self, feedback: ReviewFeedback) -> Result<()> {
        match self.status {
            ReviewAssignmentStatus::Completed => Err(EditorialError::AlreadyCompleted(self.id)),
            ReviewAssignmentStatus::Declined => {
                Err(self.invalid_state("the invitation was declined".to_string()))
            }
            _ => {
                let now = Utc::now();
                if self.responded_at.is_none() {
                    self.responded_at = Some(now);
                }
                self.status = ReviewAssignmentStatus::Completed;
                self.feedback = Some(feedback);
                self.submitted_at = Some(now);
                Ok(())
            }
        }
    }

    fn invalid_state(&self, message: String) -> EditorialError {
        EditorialError::InvalidState {
            manuscript_id: self.manuscript_id,
            message: format!("review assignment {}: {}", self.id, message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::Recommendation;

    fn assignment() -> ReviewAssignment {
        ReviewAssignment::new(
            ManuscriptId::new(),
            UserId::from("rev-1"),
            UserId::from("ed-1"),
            1,
            21,
        )
    }

    fn feedback() -> ReviewFeedback {
        ReviewFeedback {
            recommendation: Recommendation::Accept,
            rating: 4.0,
            scores: None,
            comments_to_author: "Solid work.".to_string(),
            confidential_comments: None,
        }
    }

    #[test]
    fn test_due_date_is_derived() {
        let a = assignment();
        assert_eq!(a.due_at() - a.created_at, Duration::days(21));
        assert!(!a.is_overdue(a.created_at + Duration::days(20)));
        assert!(a.is_overdue(a.created_at + Duration::days(22)));
    }

    #[test]
    fn test_accept_then_start_then_complete() {
        let mut a = assignment();
        a.respond(true).unwrap();
        assert_eq!(a.status, ReviewAssignmentStatus::Accepted);
        a.start().unwrap();
        assert_eq!(a.status, ReviewAssignmentStatus::InProgress);
        a.complete(feedback()).unwrap();
        assert_eq!(a.status, ReviewAssignmentStatus::Completed);
        assert!(a.submitted_at.is_some());
        assert!(!a.is_active());
    }

    #[test]
    fn test_complete_twice() {
        let mut a = assignment();
        a.complete(feedback()).unwrap();
        assert!(matches!(
            a.complete(feedback()),
            Err(EditorialError::AlreadyCompleted(id)) if id == a.id
        ));
    }

    #[test]
    fn test_declined_cannot_be_completed_or_answered_again() {
        let mut a = assignment();
        a.respond(false).unwrap();
        assert!(!a.is_active());
        assert!(matches!(
            a.complete(feedback()),
            Err(EditorialError::InvalidState { .. })
        ));
        assert!(a.respond(true).is_err());
    }
}
