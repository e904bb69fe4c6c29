//! HTTP error handling and response types.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::repository::RepositoryError;
use crate::services::EngineError;

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Body or query string that could not be decoded
    BadRequest(String),
    /// Engine failure, mapped by kind
    Engine(EngineError),
}

/// Status code for an engine error.
pub fn status_for(err: &EngineError) -> StatusCode {
    match err {
        EngineError::InvalidArgument { .. } => StatusCode::BAD_REQUEST,
        EngineError::ResourceNotFound { .. } => StatusCode::NOT_FOUND,
        EngineError::PrimaryCheckFailed(_)
        | EngineError::SecondaryComputationFailure { .. }
        | EngineError::Repository(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ApiError::new("INVALID_ARGUMENT", msg),
            ),
            AppError::Engine(err) => {
                let status = status_for(&err);
                let body = match &err {
                    EngineError::InvalidArgument { field, .. } => {
                        ApiError::new(err.code(), err.to_string()).with_details(*field)
                    }
                    _ => ApiError::new(err.code(), err.to_string()),
                };
                (status, body)
            }
        };

        (status, Json(error)).into_response()
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        AppError::Engine(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        AppError::Engine(EngineError::Repository(err))
    }
}
