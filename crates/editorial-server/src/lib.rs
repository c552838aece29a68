//! Editorial Server - JSON API for the editorial workflow engine
//!
//! A thin caller of [`editorial_core::WorkflowEngine`]: resolves the actor
//! from the `X-Actor-Id` header, maps engine errors to HTTP statuses and
//! hands produced events to a background notification dispatcher.

pub mod actor;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod http;

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use editorial_core::notification::Mailer;
use editorial_core::{Directory, EditorialConfig, InMemoryDirectory, InMemoryStorage, Storage, WorkflowEngine};

pub use config::{ServerConfig, ServerError};
pub use dispatcher::{LogMailer, Notifier};

/// Shared application state
pub struct AppState {
    pub engine: Arc<WorkflowEngine>,
    pub directory: Arc<dyn Directory>,
    pub notifier: Notifier,
}

impl AppState {
    /// Must be called inside a tokio runtime (starts the dispatcher)
    pub fn new(
        storage: Arc<dyn Storage>,
        directory: Arc<dyn Directory>,
        config: EditorialConfig,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let engine = Arc::new(WorkflowEngine::new(storage, Arc::clone(&directory), config));
        let notifier = Notifier::spawn(Arc::clone(&directory), mailer);
        Self {
            engine,
            directory,
            notifier,
        }
    }

    /// Build storage and roster from the server configuration
    pub fn from_config(config: &ServerConfig) -> Result<Self, ServerError> {
        let directory: Arc<dyn Directory> = match &config.roster_path {
            Some(path) => {
                let roster = InMemoryDirectory::load(path)?;
                tracing::info!(members = roster.len(), "Loaded roster from {:?}", path);
                Arc::new(roster)
            }
            None => {
                tracing::warn!("No roster configured, every request will be rejected");
                Arc::new(InMemoryDirectory::new())
            }
        };

        let storage = open_storage(config)?;
        Ok(Self::new(
            storage,
            directory,
            config.editorial.clone(),
            Arc::new(LogMailer),
        ))
    }
}

#[cfg(feature = "sqlite")]
fn open_storage(config: &ServerConfig) -> Result<Arc<dyn Storage>, ServerError> {
    match &config.database_path {
        Some(path) => {
            let storage = editorial_core::SqliteStorage::open(path)?;
            tracing::info!("Opened database at {:?}", path);
            Ok(Arc::new(storage))
        }
        None => Ok(Arc::new(InMemoryStorage::new())),
    }
}

#[cfg(not(feature = "sqlite"))]
fn open_storage(config: &ServerConfig) -> Result<Arc<dyn Storage>, ServerError> {
    match &config.database_path {
        Some(_) => Err(ServerError::Unsupported(
            "database_path requires the sqlite feature".to_string(),
        )),
        None => Ok(Arc::new(InMemoryStorage::new())),
    }
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Manuscript endpoints
        .route(
            "/manuscripts",
            post(http::submit_article).get(http::list_manuscripts),
        )
        .route("/manuscripts/{id}", get(http::get_manuscript))
        .route("/manuscripts/{id}/events", get(http::get_manuscript_events))
        .route(
            "/manuscripts/{id}/technical-check",
            post(http::pass_technical_check),
        )
        // Editor endpoints
        .route(
            "/manuscripts/{id}/editor",
            put(http::assign_editor).delete(http::unassign_editor),
        )
        .route("/manuscripts/{id}/editor/auto", post(http::auto_assign_editor))
        // Review endpoints
        .route("/manuscripts/{id}/reviewers", post(http::assign_reviewer))
        .route("/manuscripts/{id}/reviews", get(http::list_reviews))
        .route("/manuscripts/{id}/reviews/summary", get(http::review_summary))
        .route(
            "/review-assignments/{id}/response",
            post(http::respond_to_invitation),
        )
        .route("/review-assignments/{id}/start", post(http::start_review))
        .route("/review-assignments/{id}/review", post(http::submit_review))
        // Decision and revision endpoints
        .route("/manuscripts/{id}/decision", post(http::record_decision))
        .route(
            "/manuscripts/{id}/revisions",
            post(http::submit_revision).get(http::revision_history),
        )
        .route(
            "/manuscripts/{id}/revisions/validate",
            post(http::validate_revision),
        )
        // Conflict of interest endpoints
        .route("/manuscripts/{id}/conflicts", post(http::submit_questionnaire))
        .route(
            "/manuscripts/{id}/conflicts/{respondent}/{role}",
            get(http::get_questionnaire),
        )
        // Publication
        .route("/issues", post(http::publish_issue))
        // System endpoints
        .route("/health", get(http::health))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the server
pub async fn serve(addr: &str, state: Arc<AppState>) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Editorial server listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
