//! Error types shared across the support-desk crates.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to load the FAQ knowledge base.
///
/// Always fatal at startup: the knowledge base is the only grounding the
/// answers have, so there is no partial load and no fallback.
#[derive(Debug, Error)]
pub enum KnowledgeBaseError {
    /// Source file missing or unreadable
    #[error("Failed to read knowledge base {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Source is not a JSON array of {question, answer} records
    #[error("Malformed knowledge base: {0}")]
    Parse(#[from] serde_json::Error),

    /// A record is present but unusable
    #[error("Invalid knowledge base entry #{index}: {reason}")]
    InvalidEntry { index: usize, reason: String },
}

/// Configuration error
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Layered config could not be built or deserialized
    #[error("Configuration error: {0}")]
    Load(#[from] config::ConfigError),

    /// A value is out of range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
