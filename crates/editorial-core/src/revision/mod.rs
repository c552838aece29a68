//! Manuscript versions across revision cycles

mod manager;
mod revision;

pub use manager::{RevisionManager, ValidationResult};
pub use revision::{Revision, RevisionInput, RevisionReceipt};
