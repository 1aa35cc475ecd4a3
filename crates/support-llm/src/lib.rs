//! Chat completion clients.
//!
//! The answer pipeline only needs "send these role-tagged messages, get text
//! back". [`ChatModel`] is that seam; [`ApiChatModel`] talks to hosted
//! providers and [`MockChatModel`] records calls for tests.

mod api;
mod error;
mod message;
mod mock;

pub use api::{ApiChatModel, ApiChatModelConfig};
pub use error::LlmError;
pub use message::{ChatMessage, ChatRole};
pub use mock::MockChatModel;

use async_trait::async_trait;

/// Pluggable chat completion backend.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Complete a conversation and return the assistant's reply text.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError>;

    /// Model identifier, for logging.
    fn model_name(&self) -> &str;
}
