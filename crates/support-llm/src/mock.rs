//! Mock chat model for testing.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::LlmError;
use crate::message::{ChatMessage, ChatRole};
use crate::ChatModel;

/// Chat model that records every call and replies from a script.
///
/// Scripted replies are consumed in order; once the script is empty it answers
/// `"<prefix> <last user message>"`.
pub struct MockChatModel {
    prefix: String,
    script: Mutex<VecDeque<Result<String, LlmError>>>,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl MockChatModel {
    pub fn new() -> Self {
        Self::with_prefix("Mock answer:")
    }

    /// Create with a custom prefix for unscripted replies.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            script: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue a reply for the next call.
    pub fn push_reply(&self, reply: impl Into<String>) -> &Self {
        self.lock_script().push_back(Ok(reply.into()));
        self
    }

    /// Queue a failure for the next call.
    pub fn push_error(&self, error: LlmError) -> &Self {
        self.lock_script().push_back(Err(error));
        self
    }

    /// Number of completed calls.
    pub fn call_count(&self) -> usize {
        self.lock_calls().len()
    }

    /// Every message list received, in call order.
    pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.lock_calls().clone()
    }

    pub fn last_call(&self) -> Option<Vec<ChatMessage>> {
        self.lock_calls().last().cloned()
    }

    fn lock_script(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<String, LlmError>>> {
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_calls(&self) -> std::sync::MutexGuard<'_, Vec<Vec<ChatMessage>>> {
        self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MockChatModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatModel for MockChatModel {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        self.lock_calls().push(messages.to_vec());

        if let Some(scripted) = self.lock_script().pop_front() {
            return scripted;
        }

        let last_user = messages
            .iter()
            .rev()
            .find(|m| m.role == ChatRole::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default();

        Ok(format!("{} {}", self.prefix, last_user))
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_reply_echoes_user() {
        let model = MockChatModel::new();
        let reply = model
            .complete(&[ChatMessage::system("sys"), ChatMessage::user("hello")])
            .await
            .unwrap();
        assert_eq!(reply, "Mock answer: hello");
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test]
    async fn test_script_consumed_in_order() {
        let model = MockChatModel::new();
        model.push_reply("first").push_error(LlmError::Timeout);

        let msgs = [ChatMessage::user("q")];
        assert_eq!(model.complete(&msgs).await.unwrap(), "first");
        assert!(matches!(model.complete(&msgs).await, Err(LlmError::Timeout)));
        assert_eq!(model.complete(&msgs).await.unwrap(), "Mock answer: q");
        assert_eq!(model.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_custom_prefix() {
        let model = MockChatModel::with_prefix("Echo:");
        let reply = model.complete(&[ChatMessage::user("ping")]).await.unwrap();
        assert_eq!(reply, "Echo: ping");
        assert_eq!(model.last_call().unwrap().len(), 1);
    }
}
