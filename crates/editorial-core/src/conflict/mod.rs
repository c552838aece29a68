//! Conflict-of-interest questionnaires and their evaluation
//!
//! Associate editors and reviewers declare conflicts per manuscript. A
//! questionnaire is write-once; a declared conflict blocks assignment.

mod evaluator;
mod questionnaire;

pub use evaluator::{evaluate, evaluate_indicators, require_answers, ConflictResult};
pub use questionnaire::{
    ConflictIndicators, ConflictQuestionnaire, ConflictQuestionnaireInput, RespondentRole,
};
