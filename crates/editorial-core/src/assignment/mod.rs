//! Associate editor and reviewer assignments

mod editor;
mod engine;
mod review;

pub use editor::EditorAssignment;
pub use engine::AssignmentEngine;
pub use review::{ReviewAssignment, ReviewAssignmentStatus};
