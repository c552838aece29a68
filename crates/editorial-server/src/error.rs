//! Mapping engine errors onto HTTP responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use editorial_core::{EditorialError, ErrorKind, FieldError};

/// Error returned by every handler
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: &'static str,
    message: String,
    fields: Vec<FieldError>,
}

impl ApiError {
    fn new(status: StatusCode, kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            kind,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_request", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthenticated", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        let message = message.into();
        tracing::error!(error = %message, "Request failed");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", "internal error")
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<EditorialError> for ApiError {
    fn from(err: EditorialError) -> Self {
        let (status, kind) = match err.kind() {
            ErrorKind::Validation => (StatusCode::UNPROCESSABLE_ENTITY, "validation"),
            ErrorKind::BusinessRule => (StatusCode::CONFLICT, "business_rule"),
            ErrorKind::Authorization => (StatusCode::FORBIDDEN, "forbidden"),
            ErrorKind::NotFound => (StatusCode::NOT_FOUND, "not_found"),
            ErrorKind::Idempotency => (StatusCode::BAD_REQUEST, "duplicate"),
            ErrorKind::AssignmentSelection => (StatusCode::CONFLICT, "assignment_selection"),
            ErrorKind::Busy => (StatusCode::SERVICE_UNAVAILABLE, "busy"),
            ErrorKind::Infrastructure => return ApiError::internal(err.to_string()),
        };

        Self {
            status,
            kind,
            message: err.to_string(),
            fields: err.field_errors().to_vec(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "success": false,
            "error": self.message,
            "kind": self.kind,
            "fields": self.fields,
        });
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use editorial_core::{ManuscriptId, ReviewAssignmentId, StorageError, UserId};

    #[test]
    fn test_status_mapping() {
        let cases = [
            (EditorialError::Validation(vec![]), StatusCode::UNPROCESSABLE_ENTITY),
            (EditorialError::AccessDenied("no".into()), StatusCode::FORBIDDEN),
            (EditorialError::ManuscriptBusy(ManuscriptId::new()), StatusCode::SERVICE_UNAVAILABLE),
            (EditorialError::AmbiguousAssignment { candidates: 2 }, StatusCode::CONFLICT),
            (
                EditorialError::DuplicateAssignment {
                    manuscript_id: ManuscriptId::new(),
                    reviewer_id: UserId::from("rev-1"),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                EditorialError::DuplicateSubmission("questionnaire".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                EditorialError::AlreadyCompleted(ReviewAssignmentId::new()),
                StatusCode::BAD_REQUEST,
            ),
            (
                EditorialError::Storage(StorageError::Unavailable("down".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn test_storage_details_hidden() {
        let err = ApiError::from(EditorialError::Storage(StorageError::Database(
            "disk I/O error at page 7".into(),
        )));
        assert_eq!(err.message, "internal error");
    }
}
