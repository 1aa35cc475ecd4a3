//! # support-types
//!
//! Shared domain types for the Support Desk system.
//!
//! This crate defines the core data structures used throughout the system:
//! - FAQ entries: question/answer pairs forming the knowledge base
//! - Turns: role-tagged messages making up a session's conversation
//! - Knowledge base loading from a JSON source
//! - Settings: layered configuration
//!
//! ## Usage
//!
//! ```rust
//! use support_types::{FaqEntry, Turn};
//!
//! let entry = FaqEntry::new("How do I reset my password?", "Use the Forgot Password link.");
//! let turn = Turn::human(&entry.question);
//! assert!(turn.is_human());
//! ```

pub mod config;
pub mod error;
pub mod faq;
pub mod knowledge_base;
pub mod turn;

pub use config::{
    AnonymousSessionPolicy, ChatSettings, EmbeddingSettings, LlmProvider, LlmSettings,
    PoolingStrategy, RetrievalSettings, SessionSettings, Settings, DEFAULT_SESSION_ID,
    MAX_LLM_RETRIES,
};
pub use error::{KnowledgeBaseError, SettingsError};
pub use faq::FaqEntry;
pub use knowledge_base::{load_knowledge_base, parse_knowledge_base};
pub use turn::{Role, Turn};
