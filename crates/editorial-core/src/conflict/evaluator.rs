//! Conflict-of-interest evaluation
//!
//! Pure: the same questionnaire always produces the same result.

use serde::{Deserialize, Serialize};

use super::questionnaire::{ConflictIndicators, ConflictQuestionnaireInput};
use crate::error::{EditorialError, FieldError, Result};

/// Outcome of evaluating a questionnaire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictResult {
    pub has_conflicts: bool,
    /// Labels of the declared conflicts, comma separated
    pub detail: String,
}

/// Indicator labels, in reporting order
const LABELS: [&str; 5] = [
    "affiliation",
    "collaboration",
    "financial interests",
    "personal relationship",
    "institutional conflict",
];

/// Check that every answer is present and turn the input into indicators
pub fn require_answers(input: &ConflictQuestionnaireInput) -> Result<ConflictIndicators> {
    let answers = [
        ("has_affiliation", input.has_affiliation),
        ("has_collaboration", input.has_collaboration),
        ("has_financial_interests", input.has_financial_interests),
        ("has_personal_relationship", input.has_personal_relationship),
        ("has_institutional_conflict", input.has_institutional_conflict),
        ("can_review_objectively", input.can_review_objectively),
    ];

    let missing: Vec<FieldError> = answers
        .iter()
        .filter(|(_, value)| value.is_none())
        .map(|(field, _)| FieldError::new(*field, "an answer is required"))
        .collect();
    if !missing.is_empty() {
        return Err(EditorialError::Validation(missing));
    }

    Ok(ConflictIndicators {
        affiliation: input.has_affiliation.unwrap_or_default(),
        collaboration: input.has_collaboration.unwrap_or_default(),
        financial_interests: input.has_financial_interests.unwrap_or_default(),
        personal_relationship: input.has_personal_relationship.unwrap_or_default(),
        institutional_conflict: input.has_institutional_conflict.unwrap_or_default(),
        can_review_objectively: input.can_review_objectively.unwrap_or_default(),
    })
}

/// Evaluate a complete set of indicators
pub fn evaluate_indicators(indicators: &ConflictIndicators) -> ConflictResult {
    let flags = [
        indicators.affiliation,
        indicators.collaboration,
        indicators.financial_interests,
        indicators.personal_relationship,
        indicators.institutional_conflict,
    ];

    let detail = LABELS
        .iter()
        .zip(flags)
        .filter(|(_, set)| *set)
        .map(|(label, _)| *label)
        .collect::<Vec<_>>()
        .join(", ");

    ConflictResult {
        has_conflicts: flags.iter().any(|f| *f) || !indicators.can_review_objectively,
        detail,
    }
}

/// Evaluate a questionnaire as submitted; fails if any answer is missing
pub fn evaluate(input: &ConflictQuestionnaireInput) -> Result<ConflictResult> {
    let indicators = require_answers(input)?;
    Ok(evaluate_indicators(&indicators))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflict::RespondentRole;
    use crate::ids::ManuscriptId;

    fn answered(flags: [bool; 5], objective: bool) -> ConflictQuestionnaireInput {
        ConflictQuestionnaireInput {
            manuscript_id: ManuscriptId::new(),
            role: RespondentRole::Reviewer,
            has_affiliation: Some(flags[0]),
            has_collaboration: Some(flags[1]),
            has_financial_interests: Some(flags[2]),
            has_personal_relationship: Some(flags[3]),
            has_institutional_conflict: Some(flags[4]),
            can_review_objectively: Some(objective),
            details: None,
        }
    }

    #[test]
    fn test_no_conflicts() {
        let result = evaluate(&answered([false; 5], true)).unwrap();
        assert!(!result.has_conflicts);
        assert!(result.detail.is_empty());
    }

    #[test]
    fn test_financial_interest_only() {
        let result = evaluate(&answered([false, false, true, false, false], true)).unwrap();
        assert!(result.has_conflicts);
        assert_eq!(result.detail, "financial interests");
    }

    #[test]
    fn test_detail_order() {
        let result = evaluate(&answered([true, false, false, true, true], true)).unwrap();
        assert_eq!(
            result.detail,
            "affiliation, personal relationship, institutional conflict"
        );
    }

    #[test]
    fn test_not_objective_is_a_conflict() {
        let result = evaluate(&answered([false; 5], false)).unwrap();
        assert!(result.has_conflicts);
        assert!(result.detail.is_empty());
    }

    #[test]
    fn test_missing_answers_are_validation_errors() {
        let mut input = answered([false; 5], true);
        input.has_collaboration = None;
        input.can_review_objectively = None;

        match evaluate(&input) {
            Err(EditorialError::Validation(errors)) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["has_collaboration", "can_review_objectively"]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
