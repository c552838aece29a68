//! Shared builders for the integration tests

use std::path::PathBuf;
use std::sync::Arc;

use editorial_core::manuscript::{Contributor, SuggestedReviewer};
use editorial_core::{
    Actor, ArticleSubmission, ConflictQuestionnaireInput, EditorialConfig, InMemoryDirectory,
    InMemoryStorage, Manuscript, ManuscriptFile, ManuscriptId, RespondentRole, RevisionInput, Role,
    Storage, WorkflowEngine,
};

/// Get the path to a fixture file
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test_fixtures")
        .join(name)
}

/// The test roster
pub fn roster() -> InMemoryDirectory {
    InMemoryDirectory::load(fixture_path("roster.toml"))
        .unwrap_or_else(|e| panic!("Failed to load roster fixture: {}", e))
}

/// An engine over in-memory storage and the test roster
pub fn engine() -> WorkflowEngine {
    engine_with(Arc::new(InMemoryStorage::new()), EditorialConfig::default())
}

pub fn engine_with(storage: Arc<dyn Storage>, config: EditorialConfig) -> WorkflowEngine {
    WorkflowEngine::new(storage, Arc::new(roster()), config)
}

pub fn author() -> Actor {
    Actor::new("author-ana", [Role::Author])
}

pub fn chief() -> Actor {
    Actor::new("eic-eve", [Role::EditorInChief])
}

pub fn editor(id: &str) -> Actor {
    Actor::new(id, [Role::Editor])
}

pub fn reviewer(id: &str) -> Actor {
    Actor::new(id, [Role::Reviewer])
}

pub fn submission() -> ArticleSubmission {
    ArticleSubmission {
        title: "Magnetic braking in young solar analogues".to_string(),
        abstract_text: "Rotation periods of young solar analogues are compared with \
                        wind-braking models; we find a saturation threshold that depends \
                        on convective turnover time."
            .to_string(),
        category: "Stellar Physics".to_string(),
        keywords: vec![
            "rotation".to_string(),
            "stellar winds".to_string(),
            "magnetism".to_string(),
        ],
        authors: vec![Contributor {
            name: "Ana Author".to_string(),
            email: "ana@uni.example".to_string(),
            affiliation: Some("University".to_string()),
            orcid: None,
            is_corresponding: true,
        }],
        recommended_reviewers: (1..=3)
            .map(|i| SuggestedReviewer {
                name: format!("Suggested {}", i),
                email: format!("s{}@inst.example", i),
                affiliation: None,
            })
            .collect(),
        files: vec![ManuscriptFile {
            name: "manuscript.pdf".to_string(),
            kind: "manuscript".to_string(),
            size_bytes: 250_000,
        }],
    }
}

/// Submit the standard article as the standard author
pub fn submitted(engine: &WorkflowEngine) -> Manuscript {
    engine
        .submit_article(&author(), submission())
        .expect("submission should succeed")
        .value
}

pub fn revision_input(manuscript_id: ManuscriptId) -> RevisionInput {
    RevisionInput {
        manuscript_id,
        response_to_reviewers: "Point 1: clarified the braking law. ".repeat(8),
        change_summary: Some("Expanded section 3".to_string()),
        files: vec![ManuscriptFile {
            name: "manuscript-r1.pdf".to_string(),
            kind: "manuscript".to_string(),
            size_bytes: 260_000,
        }],
        expected_version: None,
    }
}

/// Questionnaire with every answer false and objectivity confirmed
pub fn clean_questionnaire(manuscript_id: ManuscriptId, role: RespondentRole) -> ConflictQuestionnaireInput {
    ConflictQuestionnaireInput {
        manuscript_id,
        role,
        has_affiliation: Some(false),
        has_collaboration: Some(false),
        has_financial_interests: Some(false),
        has_personal_relationship: Some(false),
        has_institutional_conflict: Some(false),
        can_review_objectively: Some(true),
        details: None,
    }
}
