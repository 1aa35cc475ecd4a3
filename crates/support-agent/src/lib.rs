//! # support-agent
//!
//! Answer composition for Support Desk.
//!
//! For each question the agent retrieves the single best FAQ entry, grounds
//! the LLM in it together with the session's prior turns, and records the
//! exchange. When nothing matches it replies with a fixed bilingual message
//! without calling the LLM.

pub mod agent;
pub mod error;
pub mod prompt;
pub mod sessions;

pub use agent::{AgentConfig, AgentReply, SupportAgent};
pub use error::AgentError;
pub use prompt::{build_messages, system_prompt, FALLBACK_MESSAGE};
pub use sessions::{SessionGuard, SessionHandle, SessionStore, SessionStoreConfig};
