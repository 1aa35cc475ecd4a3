//! HTTP error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use support_agent::AgentError;

/// Body text for a chat request without a usable message.
pub const NO_MESSAGE: &str = "No message provided.";

/// Every failure a handler can return. All render as `{"error": ...}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Agent(#[from] AgentError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            ApiError::Agent(err) => {
                error!(kind = err.kind(), error = %err, "Chat request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": err.to_string(),
                        "kind": err.kind(),
                        "retryable": err.is_retryable(),
                    }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
