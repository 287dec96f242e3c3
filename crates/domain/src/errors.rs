//! Custom error types with proper HTTP status code mappings.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// API error response format
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

/// Domain errors with HTTP status code mappings. One variant per error kind
/// in the orchestration core's error-handling design.
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    /// Validation error (400 Bad Request)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Multiple validation errors (400 Bad Request)
    #[error("Validation failed")]
    ValidationErrors(Vec<String>),

    /// Resource not found (404 Not Found)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Unauthorized (401 Unauthorized)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Forbidden (403 Forbidden)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Conflict (409 Conflict)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Unprocessable entity - business logic error (422 Unprocessable Entity)
    #[error("Business logic error: {0}")]
    BusinessLogic(String),

    /// Container ordering was violated (LEARN before EXPERIENCE before
    /// DISCOVER). 422 Unprocessable Entity.
    #[error("Progression error: {0}")]
    ProgressionError(String),

    /// Subject not offered at the student's grade (e.g. Grade 10 ELA).
    /// Expected, not exceptional — callers get a clean response, not a 5xx.
    #[error("Subject unavailable: {0}")]
    SubjectUnavailable(String),

    /// A click was rejected (stale question, already-unlocked position, or
    /// a bingo-slot race lost to another participant). Never surfaced as a
    /// hard error to the client; kept here so handlers can log uniformly.
    #[error("Click rejected: {0}")]
    ClickRejected(String),

    /// A perpetual room's scheduler health check found it stuck.
    #[error("Scheduler stuck: {0}")]
    SchedulerStuck(String),

    /// A journey write failed to persist. The engine retains its in-memory
    /// mutation and retries on the next operation — this variant exists so
    /// the retry path can log uniformly, not to abort the caller's request.
    #[error("Journey persistence error: {0}")]
    JourneyPersistenceError(String),

    /// A content generator call failed or timed out; caller should fall
    /// back to `FallbackContentProvider`.
    #[error("Content generation error: {0}")]
    ContentGenerationError(String),

    /// Generated content failed a consistency check (off-context career,
    /// missing skill focus, duplicate question, malformed structure).
    #[error("Consistency violation: {0}")]
    ConsistencyViolation(String),

    /// Rate limit exceeded (429 Too Many Requests)
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Internal server error (500 Internal Server Error)
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),

    /// Database error (500 Internal Server Error)
    #[error("Database error")]
    Database(String),
}

impl DomainError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            DomainError::Validation(_) | DomainError::ValidationErrors(_) => {
                StatusCode::BAD_REQUEST
            }
            DomainError::NotFound(_) => StatusCode::NOT_FOUND,
            DomainError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
            DomainError::Conflict(_) | DomainError::ClickRejected(_) => StatusCode::CONFLICT,
            DomainError::BusinessLogic(_) | DomainError::ProgressionError(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            DomainError::SubjectUnavailable(_) => StatusCode::OK,
            DomainError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            DomainError::SchedulerStuck(_) => StatusCode::SERVICE_UNAVAILABLE,
            DomainError::ConsistencyViolation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            DomainError::JourneyPersistenceError(_)
            | DomainError::ContentGenerationError(_)
            | DomainError::Internal(_)
            | DomainError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Create a validation error from validator errors
    pub fn from_validation_errors(errors: validator::ValidationErrors) -> Self {
        let messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| {
                    format!(
                        "{}: {}",
                        field,
                        error
                            .message
                            .as_ref()
                            .unwrap_or(&std::borrow::Cow::Borrowed("validation failed"))
                    )
                })
            })
            .collect();

        if messages.is_empty() {
            DomainError::Validation("Invalid input".to_string())
        } else {
            DomainError::ValidationErrors(messages)
        }
    }
}

/// Implement IntoResponse for DomainError to integrate with Axum
impl IntoResponse for DomainError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Log internal errors
        if matches!(self, DomainError::Internal(_) | DomainError::Database(_)) {
            tracing::error!("Internal error: {}", self);
        }

        let body = match &self {
            DomainError::ValidationErrors(details) => ErrorResponse {
                error: "Validation failed".to_string(),
                details: Some(details.clone()),
            },
            _ => ErrorResponse {
                error: self.to_string(),
                details: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Helper to convert anyhow errors to DomainError
impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::Database(err.to_string())
    }
}
