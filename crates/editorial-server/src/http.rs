//! HTTP endpoint handlers
//!
//! The engine blocks on manuscript locks, so every call runs on the
//! blocking pool. Events from successful mutations go to the notifier.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use editorial_core::{
    ArticleSubmission, ConflictQuestionnaire, ConflictQuestionnaireInput, Decision, DecisionKind,
    EditorAssignment, Event, Manuscript, ManuscriptFile, ManuscriptId, ManuscriptStatus, Outcome,
    RespondentRole, ReviewAssignment, ReviewAssignmentId, ReviewFeedback, ReviewSummary,
    ReviewView, Revision, RevisionInput, RevisionReceipt, UserId, ValidationResult,
    WorkflowEngine,
};

use crate::actor::CurrentActor;
use crate::error::ApiError;
use crate::AppState;

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Run a read on the blocking pool
async fn run<T, F>(state: &Arc<AppState>, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&WorkflowEngine) -> editorial_core::Result<T> + Send + 'static,
{
    let engine = Arc::clone(&state.engine);
    tokio::task::spawn_blocking(move || f(&engine))
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?
        .map_err(ApiError::from)
}

/// Run a mutation and queue its events
async fn mutate<T, F>(state: &Arc<AppState>, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&WorkflowEngine) -> editorial_core::Result<Outcome<T>> + Send + 'static,
{
    let (value, events) = run(state, f).await?.into_parts();
    state.notifier.notify(events);
    Ok(value)
}

fn manuscript_id(id: &str) -> Result<ManuscriptId, ApiError> {
    Ok(ManuscriptId::parse(id)?)
}

fn assignment_id(id: &str) -> Result<ReviewAssignmentId, ApiError> {
    Ok(ReviewAssignmentId::parse(id)?)
}

// ==================== System ====================

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": editorial_core::version(),
    }))
}

// ==================== Manuscripts ====================

pub async fn submit_article(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Json(submission): Json<ArticleSubmission>,
) -> Result<(StatusCode, Json<Manuscript>), ApiError> {
    let manuscript = mutate(&state, move |engine| engine.submit_article(&actor, submission)).await?;
    Ok((StatusCode::CREATED, Json(manuscript)))
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: String,
}

pub async fn list_manuscripts(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Query(query): Query<StatusQuery>,
) -> ApiResult<Vec<Manuscript>> {
    let status = ManuscriptStatus::parse(&query.status)
        .ok_or_else(|| ApiError::bad_request(format!("unknown status {}", query.status)))?;
    let manuscripts = run(&state, move |engine| engine.manuscripts_in_status(&actor, status)).await?;
    Ok(Json(manuscripts))
}

pub async fn get_manuscript(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> ApiResult<Manuscript> {
    let id = manuscript_id(&id)?;
    Ok(Json(run(&state, move |engine| engine.get_manuscript(&actor, id)).await?))
}

pub async fn get_manuscript_events(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> ApiResult<Vec<Event>> {
    let id = manuscript_id(&id)?;
    Ok(Json(run(&state, move |engine| engine.manuscript_events(&actor, id)).await?))
}

pub async fn pass_technical_check(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> ApiResult<Manuscript> {
    let id = manuscript_id(&id)?;
    Ok(Json(
        mutate(&state, move |engine| engine.pass_technical_check(&actor, id)).await?,
    ))
}

// ==================== Editors ====================

#[derive(Debug, Deserialize)]
pub struct AssignEditorRequest {
    pub editor_id: String,
}

pub async fn assign_editor(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
    Json(request): Json<AssignEditorRequest>,
) -> ApiResult<EditorAssignment> {
    let id = manuscript_id(&id)?;
    let editor = UserId::from(request.editor_id);
    Ok(Json(
        mutate(&state, move |engine| {
            engine.assign_associate_editor(&actor, id, &editor)
        })
        .await?,
    ))
}

pub async fn auto_assign_editor(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> ApiResult<EditorAssignment> {
    let id = manuscript_id(&id)?;
    Ok(Json(
        mutate(&state, move |engine| engine.auto_assign_associate_editor(&actor, id)).await?,
    ))
}

pub async fn unassign_editor(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> ApiResult<EditorAssignment> {
    let id = manuscript_id(&id)?;
    Ok(Json(
        mutate(&state, move |engine| engine.unassign_associate_editor(&actor, id)).await?,
    ))
}

// ==================== Reviews ====================

#[derive(Debug, Deserialize)]
pub struct AssignReviewerRequest {
    pub reviewer_id: String,
}

pub async fn assign_reviewer(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
    Json(request): Json<AssignReviewerRequest>,
) -> Result<(StatusCode, Json<ReviewAssignment>), ApiError> {
    let id = manuscript_id(&id)?;
    let reviewer = UserId::from(request.reviewer_id);
    let assignment =
        mutate(&state, move |engine| engine.assign_reviewer(&actor, id, &reviewer)).await?;
    Ok((StatusCode::CREATED, Json(assignment)))
}

#[derive(Debug, Deserialize)]
pub struct InvitationResponse {
    pub accept: bool,
}

pub async fn respond_to_invitation(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
    Json(request): Json<InvitationResponse>,
) -> ApiResult<ReviewAssignment> {
    let id = assignment_id(&id)?;
    Ok(Json(
        mutate(&state, move |engine| {
            engine.respond_to_review_invitation(&actor, id, request.accept)
        })
        .await?,
    ))
}

pub async fn start_review(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> ApiResult<ReviewAssignment> {
    let id = assignment_id(&id)?;
    Ok(Json(
        mutate(&state, move |engine| engine.start_review(&actor, id)).await?,
    ))
}

pub async fn submit_review(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
    Json(feedback): Json<ReviewFeedback>,
) -> ApiResult<ReviewAssignment> {
    let id = assignment_id(&id)?;
    Ok(Json(
        mutate(&state, move |engine| engine.submit_review(&actor, id, feedback)).await?,
    ))
}

pub async fn list_reviews(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> ApiResult<Vec<ReviewView>> {
    let id = manuscript_id(&id)?;
    Ok(Json(run(&state, move |engine| engine.list_reviews(&actor, id)).await?))
}

pub async fn review_summary(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> ApiResult<ReviewSummary> {
    let id = manuscript_id(&id)?;
    Ok(Json(run(&state, move |engine| engine.review_summary(&actor, id)).await?))
}

// ==================== Decisions ====================

#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    pub decision: DecisionKind,
    #[serde(default)]
    pub comments: String,
}

pub async fn record_decision(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
    Json(request): Json<DecisionRequest>,
) -> ApiResult<Decision> {
    let id = manuscript_id(&id)?;
    Ok(Json(
        mutate(&state, move |engine| {
            engine.record_decision(&actor, id, request.decision, &request.comments)
        })
        .await?,
    ))
}

// ==================== Revisions ====================

/// Revision body; the manuscript comes from the path
#[derive(Debug, Deserialize)]
pub struct RevisionRequest {
    #[serde(default)]
    pub response_to_reviewers: String,
    #[serde(default)]
    pub change_summary: Option<String>,
    #[serde(default)]
    pub files: Vec<ManuscriptFile>,
    #[serde(default)]
    pub expected_version: Option<u32>,
}

impl RevisionRequest {
    fn into_input(self, manuscript_id: ManuscriptId) -> RevisionInput {
        RevisionInput {
            manuscript_id,
            response_to_reviewers: self.response_to_reviewers,
            change_summary: self.change_summary,
            files: self.files,
            expected_version: self.expected_version,
        }
    }
}

pub async fn submit_revision(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
    Json(request): Json<RevisionRequest>,
) -> Result<(StatusCode, Json<RevisionReceipt>), ApiError> {
    let input = request.into_input(manuscript_id(&id)?);
    let receipt = mutate(&state, move |engine| engine.submit_revision(&actor, input)).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

pub async fn validate_revision(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
    Json(request): Json<RevisionRequest>,
) -> ApiResult<ValidationResult> {
    let input = request.into_input(manuscript_id(&id)?);
    Ok(Json(
        run(&state, move |engine| {
            engine.validate_revision_submission(&actor, &input)
        })
        .await?,
    ))
}

pub async fn revision_history(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> ApiResult<Vec<Revision>> {
    let id = manuscript_id(&id)?;
    Ok(Json(
        run(&state, move |engine| engine.get_revision_history(&actor, id)).await?,
    ))
}

// ==================== Conflicts of interest ====================

/// Questionnaire body; the manuscript comes from the path
#[derive(Debug, Deserialize)]
pub struct QuestionnaireRequest {
    pub role: RespondentRole,
    pub has_affiliation: Option<bool>,
    pub has_collaboration: Option<bool>,
    pub has_financial_interests: Option<bool>,
    pub has_personal_relationship: Option<bool>,
    pub has_institutional_conflict: Option<bool>,
    pub can_review_objectively: Option<bool>,
    #[serde(default)]
    pub details: Option<String>,
}

pub async fn submit_questionnaire(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
    Json(request): Json<QuestionnaireRequest>,
) -> Result<(StatusCode, Json<ConflictQuestionnaire>), ApiError> {
    let input = ConflictQuestionnaireInput {
        manuscript_id: manuscript_id(&id)?,
        role: request.role,
        has_affiliation: request.has_affiliation,
        has_collaboration: request.has_collaboration,
        has_financial_interests: request.has_financial_interests,
        has_personal_relationship: request.has_personal_relationship,
        has_institutional_conflict: request.has_institutional_conflict,
        can_review_objectively: request.can_review_objectively,
        details: request.details,
    };
    let questionnaire = mutate(&state, move |engine| {
        engine.submit_conflict_questionnaire(&actor, input)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(questionnaire)))
}

pub async fn get_questionnaire(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path((id, respondent, role)): Path<(String, String, String)>,
) -> ApiResult<ConflictQuestionnaire> {
    let id = manuscript_id(&id)?;
    let role = RespondentRole::parse(&role)
        .ok_or_else(|| ApiError::bad_request(format!("unknown respondent role {}", role)))?;
    let respondent = UserId::from(respondent);
    Ok(Json(
        run(&state, move |engine| {
            engine.get_conflict_questionnaire(&actor, id, &respondent, role)
        })
        .await?,
    ))
}

// ==================== Publication ====================

#[derive(Debug, Deserialize)]
pub struct PublishRequest {
    pub issue: String,
    pub manuscript_ids: Vec<String>,
}

pub async fn publish_issue(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Json(request): Json<PublishRequest>,
) -> ApiResult<Vec<Manuscript>> {
    let ids = request
        .manuscript_ids
        .iter()
        .map(|id| manuscript_id(id))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(
        mutate(&state, move |engine| {
            engine.publish_issue(&actor, &request.issue, &ids)
        })
        .await?,
    ))
}
