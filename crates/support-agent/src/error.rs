//! Error type for answer composition.

use thiserror::Error;

use support_index::IndexError;
use support_llm::LlmError;

/// Runtime failures of [`SupportAgent::answer`](crate::SupportAgent::answer).
///
/// An empty retrieval is not an error; it produces the fallback reply.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Query embedding or index search failed
    #[error("Retrieval failed: {0}")]
    Retrieval(#[from] IndexError),

    /// LLM provider failed after retries
    #[error("LLM call failed: {0}")]
    Llm(#[from] LlmError),
}

impl AgentError {
    /// Short machine-readable category for API clients.
    pub fn kind(&self) -> &'static str {
        match self {
            AgentError::Retrieval(IndexError::Embedding(_)) => "embedding",
            AgentError::Retrieval(_) => "retrieval",
            AgentError::Llm(_) => "llm",
        }
    }

    /// Whether the same request may succeed if sent again.
    pub fn is_retryable(&self) -> bool {
        match self {
            AgentError::Retrieval(IndexError::Task(_)) => true,
            AgentError::Retrieval(_) => false,
            AgentError::Llm(e) => e.is_retryable(),
        }
    }
}
