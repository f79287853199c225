use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Hint attached to every remote failure; the warehouse keeps the full trace
const QUERY_HISTORY_HINT: &str =
    "The full error is available in the warehouse Query History (Snowsight).";

/// Application error type that can be returned from handlers
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Validation errors, raised before any statement leaves the process
    #[error("Validation error: {0}")]
    Validation(String),

    // Warehouse errors: DDL failures, permission errors, script runtime errors
    #[error("Remote execution error: {0}")]
    RemoteExecution(String),

    // Internal errors
    #[error("Internal server error")]
    Internal(String),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<&'static str>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, details, hint) = match &self {
            // 400 Bad Request
            AppError::Validation(msg) => {
                tracing::warn!("Validation error: {}", msg);
                (
                    StatusCode::BAD_REQUEST,
                    "Validation error",
                    Some(msg.clone()),
                    None,
                )
            }

            // 502 Bad Gateway
            AppError::RemoteExecution(msg) => {
                tracing::error!("Remote execution error: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "Remote execution error",
                    Some(msg.clone()),
                    Some(QUERY_HISTORY_HINT),
                )
            }

            // 500 Internal Server Error
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                    None,
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_message.to_string(),
            details,
            hint,
        });

        (status, body).into_response()
    }
}

// Convenient conversions from common error types

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AppError::Internal(format!("Malformed warehouse response: {}", err))
        } else {
            AppError::RemoteExecution(format!("Warehouse request failed: {}", err))
        }
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
