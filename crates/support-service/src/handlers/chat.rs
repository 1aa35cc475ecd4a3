use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use support_types::Turn;

use crate::error::{ApiError, NO_MESSAGE};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub session_id: String,
    pub turns: Vec<Turn>,
}

/// Parse the raw body so malformed JSON gets the same error shape as a
/// missing message. An empty body counts as a missing message.
fn parse_request(body: &[u8]) -> Result<ChatRequest, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ChatRequest::default());
    }

    serde_json::from_slice(body).map_err(|e| {
        debug!(error = %e, "Rejecting malformed chat body");
        ApiError::BadRequest(format!("Invalid JSON body: {e}"))
    })
}

pub async fn chat(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ChatResponse>, ApiError> {
    let request = parse_request(&body)?;

    let message = match request.message {
        Some(message) if !message.trim().is_empty() => message,
        _ => return Err(ApiError::BadRequest(NO_MESSAGE.to_string())),
    };
    let session_id = state.resolve_session_id(request.session_id);

    info!(session_id = %session_id, chars = message.chars().count(), "Chat request");

    let response = state.agent.answer(&message, &session_id).await?;

    Ok(Json(ChatResponse {
        response,
        session_id,
    }))
}

pub async fn history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let turns = state
        .agent
        .sessions()
        .history(&session_id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Session not found: {session_id}")))?;

    Ok(Json(HistoryResponse { session_id, turns }))
}

/// Forget a session. Succeeds whether or not it existed.
pub async fn reset(State(state): State<AppState>, Path(session_id): Path<String>) -> StatusCode {
    if state.agent.sessions().remove(&session_id) {
        info!(session_id = %session_id, "Session reset");
    }
    StatusCode::NO_CONTENT
}
