//! Conflict questionnaire records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::evaluator::ConflictResult;
use crate::ids::{ManuscriptId, QuestionnaireId, UserId};

/// Capacity in which the respondent would handle the manuscript
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RespondentRole {
    AssociateEditor,
    Reviewer,
}

impl RespondentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            RespondentRole::AssociateEditor => "associate-editor",
            RespondentRole::Reviewer => "reviewer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "associate-editor" => Some(RespondentRole::AssociateEditor),
            "reviewer" => Some(RespondentRole::Reviewer),
            _ => None,
        }
    }
}

impl std::fmt::Display for RespondentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Questionnaire as it arrives from a form; unanswered questions are `None`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictQuestionnaireInput {
    pub manuscript_id: ManuscriptId,
    pub role: RespondentRole,
    #[serde(default)]
    pub has_affiliation: Option<bool>,
    #[serde(default)]
    pub has_collaboration: Option<bool>,
    #[serde(default)]
    pub has_financial_interests: Option<bool>,
    #[serde(default)]
    pub has_personal_relationship: Option<bool>,
    #[serde(default)]
    pub has_institutional_conflict: Option<bool>,
    #[serde(default)]
    pub can_review_objectively: Option<bool>,
    /// Free-text explanation from the respondent
    #[serde(default)]
    pub details: Option<String>,
}

/// Fully answered indicators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictIndicators {
    pub affiliation: bool,
    pub collaboration: bool,
    pub financial_interests: bool,
    pub personal_relationship: bool,
    pub institutional_conflict: bool,
    pub can_review_objectively: bool,
}

/// A completed, immutable questionnaire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictQuestionnaire {
    pub id: QuestionnaireId,
    pub manuscript_id: ManuscriptId,
    pub respondent_id: UserId,
    pub role: RespondentRole,
    pub indicators: ConflictIndicators,
    pub has_conflicts: bool,
    /// Evaluated conflict labels
    pub conflict_summary: String,
    /// Respondent's own explanation
    pub details: Option<String>,
    pub completed_at: DateTime<Utc>,
}

impl ConflictQuestionnaire {
    pub fn complete(
        respondent_id: UserId,
        input: &ConflictQuestionnaireInput,
        indicators: ConflictIndicators,
        result: ConflictResult,
    ) -> Self {
        Self {
            id: QuestionnaireId::new(),
            manuscript_id: input.manuscript_id,
            respondent_id,
            role: input.role,
            indicators,
            has_conflicts: result.has_conflicts,
            conflict_summary: result.detail,
            details: input
                .details
                .as_ref()
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            completed_at: Utc::now(),
        }
    }

    /// Key under which questionnaires are unique
    pub fn key(&self) -> (ManuscriptId, UserId, RespondentRole) {
        (self.manuscript_id, self.respondent_id.clone(), self.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_names() {
        assert_eq!(
            serde_json::to_string(&RespondentRole::AssociateEditor).unwrap(),
            "\"associate-editor\""
        );
        assert_eq!(
            RespondentRole::parse("reviewer"),
            Some(RespondentRole::Reviewer)
        );
        assert_eq!(RespondentRole::parse("editor"), None);
    }

    #[test]
    fn test_unanswered_fields_deserialize_as_none() {
        let input: ConflictQuestionnaireInput = serde_json::from_str(&format!(
            r#"{{"manuscript_id":"{}","role":"reviewer","has_affiliation":true}}"#,
            ManuscriptId::new()
        ))
        .unwrap();
        assert_eq!(input.has_affiliation, Some(true));
        assert_eq!(input.can_review_objectively, None);
    }
}
