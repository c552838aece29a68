//! Review aggregation for editor decision support

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Recommendation, SubScores};
use crate::assignment::{ReviewAssignment, ReviewAssignmentStatus};
use crate::config::ReviewConfig;
use crate::error::{EditorialError, Result};
use crate::ids::{ManuscriptId, ReviewAssignmentId, UserId};
use crate::manuscript::Manuscript;
use crate::role::{Actor, Capabilities};

/// Who is looking at the reviews
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// The manuscript's author: reviewers stay anonymous, no confidential comments
    Author,
    /// Assigned editor, editorial staff and admins
    Editorial,
}

/// One entry in the merged review listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewView {
    pub assignment_id: ReviewAssignmentId,
    /// Hidden from authors
    pub reviewer_id: Option<UserId>,
    pub status: ReviewAssignmentStatus,
    pub round: u32,
    pub recommendation: Option<Recommendation>,
    pub rating: Option<f64>,
    pub scores: Option<SubScores>,
    /// True when `scores` were approximated from the overall rating
    pub scores_derived: bool,
    pub comments_to_author: Option<String>,
    pub confidential_comments: Option<String>,
    pub due_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
}

/// Decision-support summary of a manuscript's reviews
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewSummary {
    pub manuscript_id: ManuscriptId,
    pub invited: usize,
    pub pending: usize,
    pub accepted: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub declined: usize,
    pub overdue: usize,
    /// Mean overall rating of completed reviews
    pub mean_rating: Option<f64>,
    pub recommendations: BTreeMap<Recommendation, usize>,
    /// Recommendation held by a strict majority of completed reviews
    pub consensus: Option<Recommendation>,
}

/// Merges review assignments into a single view
pub struct ReviewAggregator<'a> {
    config: &'a ReviewConfig,
}

impl<'a> ReviewAggregator<'a> {
    pub fn new(config: &'a ReviewConfig) -> Self {
        Self { config }
    }

    /// Decide what the actor may see of the manuscript's reviews
    pub fn audience(actor: &Actor, manuscript: &Manuscript) -> Result<Audience> {
        if manuscript.is_editor(&actor.id) || actor.can(Capabilities::VIEW_REVIEWS) {
            Ok(Audience::Editorial)
        } else if manuscript.is_author(&actor.id) {
            Ok(Audience::Author)
        } else {
            Err(EditorialError::AccessDenied(format!(
                "{} may not view reviews of manuscript {}",
                actor.id, manuscript.id
            )))
        }
    }

    /// Completed and in-progress reviews, then accepted invitations as placeholders
    pub fn merge(&self, assignments: &[ReviewAssignment], audience: Audience) -> Vec<ReviewView> {
        let reviews = assignments.iter().filter(|a| {
            matches!(
                a.status,
                ReviewAssignmentStatus::Completed | ReviewAssignmentStatus::InProgress
            )
        });
        let invitations = assignments
            .iter()
            .filter(|a| a.status == ReviewAssignmentStatus::Accepted);

        reviews
            .map(|a| self.review_view(a, audience))
            .chain(invitations.map(|a| Self::placeholder(a, audience)))
            .collect()
    }

    fn review_view(&self, assignment: &ReviewAssignment, audience: Audience) -> ReviewView {
        let feedback = assignment.feedback.as_ref();
        let (scores, scores_derived) = match feedback {
            Some(fb) => match fb.scores {
                Some(scores) => (Some(scores), false),
                None => (
                    Some(SubScores::derived(
                        fb.rating,
                        &self.config.subscore_factors,
                        self.config.rating_scale_max,
                    )),
                    true,
                ),
            },
            None => (None, false),
        };

        ReviewView {
            assignment_id: assignment.id,
            reviewer_id: Self::reviewer(assignment, audience),
            status: assignment.status,
            round: assignment.round,
            recommendation: feedback.map(|fb| fb.recommendation),
            rating: feedback.map(|fb| fb.rating),
            scores,
            scores_derived,
            comments_to_author: feedback.map(|fb| fb.comments_to_author.clone()),
            confidential_comments: match audience {
                Audience::Editorial => feedback.and_then(|fb| fb.confidential_comments.clone()),
                Audience::Author => None,
            },
            due_at: assignment.due_at(),
            submitted_at: assignment.submitted_at,
        }
    }

    fn placeholder(assignment: &ReviewAssignment, audience: Audience) -> ReviewView {
        ReviewView {
            assignment_id: assignment.id,
            reviewer_id: Self::reviewer(assignment, audience),
            status: ReviewAssignmentStatus::InProgress,
            round: assignment.round,
            recommendation: None,
            rating: None,
            scores: None,
            scores_derived: false,
            comments_to_author: None,
            confidential_comments: None,
            due_at: assignment.due_at(),
            submitted_at: None,
        }
    }

    fn reviewer(assignment: &ReviewAssignment, audience: Audience) -> Option<UserId> {
        match audience {
            Audience::Editorial => Some(assignment.reviewer_id.clone()),
            Audience::Author => None,
        }
    }

    /// Counts, mean rating and majority recommendation
    pub fn summarize(
        manuscript_id: ManuscriptId,
        assignments: &[ReviewAssignment],
        now: DateTime<Utc>,
    ) -> ReviewSummary {
        let count = |status: ReviewAssignmentStatus| {
            assignments.iter().filter(|a| a.status == status).count()
        };

        let completed: Vec<_> = assignments.iter().filter_map(|a| a.feedback.as_ref()).collect();

        let mean_rating = if completed.is_empty() {
            None
        } else {
            Some(completed.iter().map(|fb| fb.rating).sum::<f64>() / completed.len() as f64)
        };

        let mut recommendations = BTreeMap::new();
        for fb in &completed {
            *recommendations.entry(fb.recommendation).or_insert(0) += 1;
        }

        let consensus = recommendations
            .iter()
            .find(|(_, n)| **n * 2 > completed.len())
            .map(|(rec, _)| *rec);

        ReviewSummary {
            manuscript_id,
            invited: assignments.len(),
            pending: count(ReviewAssignmentStatus::Pending),
            accepted: count(ReviewAssignmentStatus::Accepted),
            in_progress: count(ReviewAssignmentStatus::InProgress),
            completed: count(ReviewAssignmentStatus::Completed),
            declined: count(ReviewAssignmentStatus::Declined),
            overdue: assignments.iter().filter(|a| a.is_overdue(now)).count(),
            mean_rating,
            recommendations,
            consensus,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::ReviewFeedback;
    use crate::role::Role;

    fn assignment(ms: ManuscriptId, reviewer: &str) -> ReviewAssignment {
        ReviewAssignment::new(ms, UserId::from(reviewer), UserId::from("ed"), 1, 21)
    }

    fn completed(ms: ManuscriptId, reviewer: &str, rec: Recommendation, rating: f64) -> ReviewAssignment {
        let mut a = assignment(ms, reviewer);
        a.complete(ReviewFeedback {
            recommendation: rec,
            rating,
            scores: None,
            comments_to_author: "Comments".to_string(),
            confidential_comments: Some("Between us".to_string()),
        })
        .unwrap();
        a
    }

    fn accepted(ms: ManuscriptId, reviewer: &str) -> ReviewAssignment {
        let mut a = assignment(ms, reviewer);
        a.respond(true).unwrap();
        a
    }

    #[test]
    fn test_merge_order_and_placeholders() {
        let ms = ManuscriptId::new();
        let mut declined = assignment(ms, "r-declined");
        declined.respond(false).unwrap();
        let assignments = vec![
            accepted(ms, "r-accepted"),
            assignment(ms, "r-pending"),
            completed(ms, "r-done", Recommendation::Accept, 4.0),
            declined,
        ];

        let config = ReviewConfig::default();
        let views = ReviewAggregator::new(&config).merge(&assignments, Audience::Editorial);

        assert_eq!(views.len(), 2);
        assert_eq!(views[0].reviewer_id, Some(UserId::from("r-done")));
        assert_eq!(views[0].status, ReviewAssignmentStatus::Completed);
        assert!(views[0].scores_derived);

        assert_eq!(views[1].reviewer_id, Some(UserId::from("r-accepted")));
        assert_eq!(views[1].status, ReviewAssignmentStatus::InProgress);
        assert!(views[1].rating.is_none());
        assert!(views[1].comments_to_author.is_none());
    }

    #[test]
    fn test_author_view_is_anonymous() {
        let ms = ManuscriptId::new();
        let assignments = vec![completed(ms, "r1", Recommendation::Reject, 2.0)];
        let config = ReviewConfig::default();
        let views = ReviewAggregator::new(&config).merge(&assignments, Audience::Author);

        assert!(views[0].reviewer_id.is_none());
        assert!(views[0].confidential_comments.is_none());
        assert_eq!(views[0].comments_to_author.as_deref(), Some("Comments"));
    }

    #[test]
    fn test_audience() {
        let mut m = crate::manuscript::Manuscript::from_submission(
            UserId::from("author-1"),
            crate::manuscript::ArticleSubmission::sample_valid(),
        );
        m.editor_id = Some(UserId::from("ed-1"));

        let author = Actor::new("author-1", [Role::Author]);
        let editor = Actor::new("ed-1", [Role::Reviewer]);
        let staff = Actor::new("eic", [Role::EditorInChief]);
        let stranger = Actor::new("someone", [Role::Reviewer]);

        assert_eq!(ReviewAggregator::audience(&author, &m).unwrap(), Audience::Author);
        assert_eq!(ReviewAggregator::audience(&editor, &m).unwrap(), Audience::Editorial);
        assert_eq!(ReviewAggregator::audience(&staff, &m).unwrap(), Audience::Editorial);
        assert!(matches!(
            ReviewAggregator::audience(&stranger, &m),
            Err(EditorialError::AccessDenied(_))
        ));
    }

    #[test]
    fn test_summary_majority() {
        let ms = ManuscriptId::new();
        let assignments = vec![
            completed(ms, "r1", Recommendation::MinorRevision, 4.0),
            completed(ms, "r2", Recommendation::MinorRevision, 3.0),
            completed(ms, "r3", Recommendation::Reject, 2.0),
            assignment(ms, "r4"),
        ];
        let summary = ReviewAggregator::summarize(ms, &assignments, Utc::now());

        assert_eq!(summary.invited, 4);
        assert_eq!(summary.completed, 3);
        assert_eq!(summary.pending, 1);
        assert_eq!(summary.mean_rating, Some(3.0));
        assert_eq!(summary.consensus, Some(Recommendation::MinorRevision));
    }

    #[test]
    fn test_summary_tie_has_no_consensus() {
        let ms = ManuscriptId::new();
        let assignments = vec![
            completed(ms, "r1", Recommendation::Accept, 5.0),
            completed(ms, "r2", Recommendation::Reject, 1.0),
        ];
        let summary = ReviewAggregator::summarize(ms, &assignments, Utc::now());
        assert_eq!(summary.consensus, None);
        assert_eq!(summary.recommendations.len(), 2);
    }
}
