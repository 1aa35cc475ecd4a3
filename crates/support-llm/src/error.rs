//! Error type for chat completion calls.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    /// Transport-level failure (connect, DNS, reset)
    #[error("API request failed: {0}")]
    Request(String),

    /// Provider answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Timeout waiting for response")]
    Timeout,

    #[error("Failed to parse API response: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl LlmError {
    /// Whether another attempt could succeed without changing the request.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::Request(_) | LlmError::RateLimitExceeded | LlmError::Timeout => true,
            LlmError::Status { status, .. } => *status >= 500,
            LlmError::Parse(_) | LlmError::Config(_) => false,
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Request(e.to_string())
        }
    }
}
