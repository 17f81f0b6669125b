use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-specific error types.
#[derive(Debug, Clone, Error)]
pub enum AppError {
    /// The identifier has no `@`-delimited local part.
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),
    /// Bad request error (malformed body, empty input).
    #[error("Bad request: {0}")]
    BadRequest(String),
    /// Transport or parse failure inside a single lookup.
    ///
    /// Sub-lookups catch this and fall back to default values, so it only
    /// reaches a caller that talks to a `PageSource` directly.
    #[error("Lookup failure: {0}")]
    LookupFailure(String),
    /// Unexpected fault while building the report.
    #[error("Assembly error: {0}")]
    AssemblyError(String),
}

impl IntoResponse for AppError {
    /// Converts the error into an HTTP response.
    ///
    /// Maps each error variant to an appropriate HTTP status code and JSON body.
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::InvalidIdentifier(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::LookupFailure(msg) => {
                tracing::error!("Lookup failure: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "External service error".to_string(),
                )
            }
            AppError::AssemblyError(msg) => {
                tracing::error!("Report assembly failed: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Could not build the report, please try again".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<reqwest::Error> for AppError {
    /// Converts a `reqwest::Error` into a `LookupFailure`.
    fn from(err: reqwest::Error) -> Self {
        AppError::LookupFailure(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::AssemblyError(err.to_string())
    }
}
