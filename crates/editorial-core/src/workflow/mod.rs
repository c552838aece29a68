//! The coordinating workflow engine
//!
//! [`WorkflowEngine`] owns every manuscript status change. Each mutating
//! operation takes the manuscript lock, validates, delegates to the
//! assignment, review and revision components, commits one change set and
//! returns an [`Outcome`] carrying the events the caller should deliver.

mod engine;
mod lock;

pub use engine::WorkflowEngine;
pub use lock::{ManuscriptGuard, ManuscriptLocks};

use serde::{Deserialize, Serialize};

use crate::event::Event;

/// Result of a successful engine operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome<T> {
    pub value: T,
    /// Notifications for the caller to dispatch, best-effort
    pub events: Vec<Event>,
}

impl<T> Outcome<T> {
    pub fn new(value: T, events: Vec<Event>) -> Self {
        Self { value, events }
    }

    pub fn quiet(value: T) -> Self {
        Self {
            value,
            events: Vec::new(),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            value: f(self.value),
            events: self.events,
        }
    }

    pub fn into_parts(self) -> (T, Vec<Event>) {
        (self.value, self.events)
    }
}
