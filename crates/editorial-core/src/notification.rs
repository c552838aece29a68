//! Email rendering and best-effort delivery of events
//!
//! Engine operations never send mail themselves. Callers hand the events of
//! an [`Outcome`](crate::workflow::Outcome) to [`dispatch`] after the
//! operation has committed; a failed send is logged and counted, never
//! propagated back into the workflow.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::directory::{Directory, Member};
use crate::event::{Event, EventPayload};
use crate::ids::EventId;

/// A rendered notification email
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub event_id: EventId,
}

/// Errors from a mail transport
#[derive(Debug, Error)]
pub enum MailError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Rejected recipient: {0}")]
    Rejected(String),
}

/// Outbound mail transport
pub trait Mailer: Send + Sync {
    fn send(&self, message: EmailMessage) -> Result<(), MailError>;
}

/// Counts from one dispatch run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchReport {
    pub sent: usize,
    /// Events whose recipient has no email address
    pub skipped: usize,
    pub failed: usize,
}

/// Render the email for an event, or `None` if the member has no address
pub fn render(event: &Event, member: &Member) -> Option<EmailMessage> {
    let to = member.email.clone()?;

    let subject = match &event.payload {
        EventPayload::SubmissionReceived { .. } => "Submission received".to_string(),
        EventPayload::TechnicalCheckPassed { .. } => "Technical check passed".to_string(),
        EventPayload::EditorAssigned { .. } => "New manuscript assigned to you".to_string(),
        EventPayload::EditorUnassigned { .. } => "Manuscript assignment ended".to_string(),
        EventPayload::ReviewerInvited { .. } => "Invitation to review".to_string(),
        EventPayload::ReviewInvitationAnswered { accepted, .. } => {
            if *accepted {
                "Review invitation accepted".to_string()
            } else {
                "Review invitation declined".to_string()
            }
        }
        EventPayload::ReviewSubmitted { .. } => "Review submitted".to_string(),
        EventPayload::DecisionRecorded { decision, .. } => format!("Decision: {}", decision),
        EventPayload::RevisionSubmitted { version, .. } => format!("Revision {} submitted", version),
        EventPayload::ConflictDeclared { .. } => "Conflict of interest declared".to_string(),
        EventPayload::ManuscriptPublished { issue } => format!("Published in {}", issue),
    };

    let body = format!(
        "Dear {},\n\n{}\n\nManuscript: {}\n",
        member.name,
        event.payload.description(),
        event.manuscript_id
    );

    Some(EmailMessage {
        to,
        subject: format!("[{}] {}", short_id(event), subject),
        body,
        event_id: event.id,
    })
}

fn short_id(event: &Event) -> String {
    event.manuscript_id.to_string().chars().take(8).collect()
}

/// Render and send every event; failures are logged and counted
pub fn dispatch(events: &[Event], directory: &dyn Directory, mailer: &dyn Mailer) -> DispatchReport {
    let mut report = DispatchReport::default();

    for event in events {
        let Some(member) = directory.lookup(&event.recipient_id) else {
            warn!(event_id = %event.id, recipient = %event.recipient_id, "Unknown notification recipient");
            report.failed += 1;
            continue;
        };

        let Some(message) = render(event, &member) else {
            debug!(event_id = %event.id, recipient = %member.id, "Recipient has no email, skipping");
            report.skipped += 1;
            continue;
        };

        match mailer.send(message) {
            Ok(()) => report.sent += 1,
            Err(e) => {
                warn!(event_id = %event.id, recipient = %member.id, error = %e, "Failed to send notification");
                report.failed += 1;
            }
        }
    }

    report
}
