//! # support-service
//!
//! HTTP surface of the Support Desk chatbot.
//!
//! - `GET /ping` liveness probe
//! - `POST /chat/` (or `/chat`) answer a question within a session
//! - `GET /chat/:session_id/history` inspect a session's turns
//! - `DELETE /chat/:session_id` forget a session

pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;

pub use error::{ApiError, NO_MESSAGE};
pub use handlers::{ChatRequest, ChatResponse, HistoryResponse};
pub use routes::create_routes;
pub use server::{app, run_server_with_shutdown, serve};
pub use state::AppState;
