pub mod chat;
pub mod health;

pub use chat::{chat, history, reset, ChatRequest, ChatResponse, HistoryResponse};
pub use health::ping;
