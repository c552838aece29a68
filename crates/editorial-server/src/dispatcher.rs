//! Background notification dispatch
//!
//! Handlers hand committed events to [`Notifier::notify`] and return
//! immediately. A single task drains the queue and runs the mailer on the
//! blocking pool; delivery problems are logged and dropped.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use editorial_core::notification::{dispatch, EmailMessage, MailError, Mailer};
use editorial_core::{Directory, Event};

/// Sending half of the dispatch queue
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Vec<Event>>,
}

impl Notifier {
    /// Start the dispatch task; must be called inside a tokio runtime
    pub fn spawn(directory: Arc<dyn Directory>, mailer: Arc<dyn Mailer>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Vec<Event>>();

        tokio::spawn(async move {
            while let Some(events) = rx.recv().await {
                let directory = Arc::clone(&directory);
                let mailer = Arc::clone(&mailer);
                let result = tokio::task::spawn_blocking(move || {
                    dispatch(&events, directory.as_ref(), mailer.as_ref())
                })
                .await;

                match result {
                    Ok(report) => debug!(
                        sent = report.sent,
                        skipped = report.skipped,
                        failed = report.failed,
                        "Notifications dispatched"
                    ),
                    Err(e) => warn!(error = %e, "Notification dispatch task failed"),
                }
            }
            debug!("Notification queue closed");
        });

        Self { tx }
    }

    pub fn notify(&self, events: Vec<Event>) {
        if events.is_empty() {
            return;
        }
        if self.tx.send(events).is_err() {
            warn!("Notification dispatcher stopped, dropping events");
        }
    }
}

/// Mailer that only logs; used when no transport is configured
#[derive(Debug, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, message: EmailMessage) -> Result<(), MailError> {
        info!(to = %message.to, subject = %message.subject, event_id = %message.event_id, "Email");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    use editorial_core::{EventPayload, InMemoryDirectory, ManuscriptId, Member, Role, UserId};

    #[derive(Default)]
    struct Outbox(Mutex<Vec<EmailMessage>>);

    impl Mailer for Outbox {
        fn send(&self, message: EmailMessage) -> Result<(), MailError> {
            self.0.lock().unwrap().push(message);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_events_reach_the_mailer() {
        let mut ana = Member::new("ana", "Ana", &[Role::Author]);
        ana.email = Some("ana@uni.example".to_string());
        let directory = Arc::new(InMemoryDirectory::with_members([ana]));
        let outbox = Arc::new(Outbox::default());

        let notifier = Notifier::spawn(directory, outbox.clone());
        notifier.notify(vec![Event::new(
            ManuscriptId::new(),
            UserId::from("ana"),
            UserId::from("eic"),
            EventPayload::SubmissionReceived {
                title: "A title".to_string(),
            },
        )]);

        for _ in 0..50 {
            if !outbox.0.lock().unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let sent = outbox.0.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ana@uni.example");
    }
}
