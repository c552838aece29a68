//! Manuscripts and their lifecycle
//!
//! A manuscript is created by article submission and afterwards only
//! mutated by the workflow engine. Its status follows the graph in
//! [`status`].

mod manuscript;
mod status;
mod submission;

pub use manuscript::{Contributor, Manuscript, ManuscriptFile, SuggestedReviewer};
pub use status::{ManuscriptStatus, Trigger};
pub use submission::ArticleSubmission;
