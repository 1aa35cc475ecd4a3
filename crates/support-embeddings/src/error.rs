//! Embedding error types.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("model inference failed: {0}")]
    Candle(#[from] candle_core::Error),

    #[error("tokenizer failed: {0}")]
    Tokenizer(String),

    /// config.json unreadable as a BERT config
    #[error("invalid model config {path}: {reason}")]
    InvalidConfig { path: PathBuf, reason: String },

    #[error("could not fetch {file} from {repo}: {reason}")]
    Download {
        repo: String,
        file: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}
