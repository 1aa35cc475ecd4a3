use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::handlers;
use crate::state::AppState;

pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .route("/ping", get(handlers::ping))
        .route("/chat/", post(handlers::chat))
        .route("/chat", post(handlers::chat))
        .route("/chat/:session_id", delete(handlers::reset))
        .route("/chat/:session_id/history", get(handlers::history))
        .with_state(state)
}
