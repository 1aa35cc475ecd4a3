//! Shared state handed to every handler.

use std::sync::Arc;

use support_agent::SupportAgent;
use support_types::{AnonymousSessionPolicy, DEFAULT_SESSION_ID};

#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<SupportAgent>,
    pub anonymous_sessions: AnonymousSessionPolicy,
}

impl AppState {
    pub fn new(agent: Arc<SupportAgent>, anonymous_sessions: AnonymousSessionPolicy) -> Self {
        Self {
            agent,
            anonymous_sessions,
        }
    }

    /// Session id for a request, applying the anonymous policy when the
    /// client sent none (or only whitespace).
    pub fn resolve_session_id(&self, requested: Option<String>) -> String {
        match requested {
            Some(id) if !id.trim().is_empty() => id,
            _ => match self.anonymous_sessions {
                AnonymousSessionPolicy::Generate => ulid::Ulid::new().to_string(),
                AnonymousSessionPolicy::Shared => DEFAULT_SESSION_ID.to_string(),
            },
        }
    }
}
