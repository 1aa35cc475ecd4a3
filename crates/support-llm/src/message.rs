//! Role-tagged chat messages sent to the provider.

use serde::{Deserialize, Serialize};

use support_types::{Role, Turn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(ChatRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }
}

impl From<&Turn> for ChatMessage {
    fn from(turn: &Turn) -> Self {
        let role = match turn.role {
            Role::Human => ChatRole::User,
            Role::Assistant => ChatRole::Assistant,
        };
        Self::new(role, turn.content.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_turn() {
        let human = ChatMessage::from(&Turn::human("hi"));
        let bot = ChatMessage::from(&Turn::assistant("hello"));
        assert_eq!(human, ChatMessage::user("hi"));
        assert_eq!(bot, ChatMessage::assistant("hello"));
    }

    #[test]
    fn test_role_wire_format() {
        let json = serde_json::to_value(ChatMessage::system("be nice")).unwrap();
        assert_eq!(json["role"], "system");
        assert_eq!(json["content"], "be nice");
    }
}
