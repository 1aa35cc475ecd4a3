//! Index error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    /// usearch rejected an operation
    #[error("vector index: {0}")]
    Index(String),

    #[error("embedding has {actual} dimensions, index expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("query embedding failed: {0}")]
    Embedding(#[from] support_embeddings::EmbeddingError),

    /// The blocking search task panicked or was cancelled
    #[error("search task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
