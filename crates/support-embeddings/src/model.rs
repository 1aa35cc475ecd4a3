//! Embedding vectors and the model interface.

use crate::error::EmbeddingError;

/// Unit-length embedding vector. A zero vector stays zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding(Vec<f32>);

impl Embedding {
    /// Normalize `values` to unit length.
    pub fn new(mut values: Vec<f32>) -> Self {
        let norm = values.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            values.iter_mut().for_each(|x| *x /= norm);
        }
        Self(values)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }

    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    /// Cosine similarity in [-1, 1]; 0.0 when dimensions differ.
    pub fn cosine_similarity(&self, other: &Embedding) -> f32 {
        if self.dimension() != other.dimension() {
            return 0.0;
        }
        // unit vectors: dot product == cosine
        self.0.iter().zip(&other.0).map(|(a, b)| a * b).sum()
    }
}

impl AsRef<[f32]> for Embedding {
    fn as_ref(&self) -> &[f32] {
        &self.0
    }
}

/// What a loaded model produces.
#[derive(Debug, Clone)]
pub struct ModelInfo {
    /// Short name for logs, e.g. "bge-small-en-v1.5"
    pub name: String,
    pub dimension: usize,
    /// Longer inputs are truncated
    pub max_tokens: usize,
}

/// Text to vector. Shared across blocking tasks, hence `Send + Sync`.
pub trait EmbeddingModel: Send + Sync {
    fn info(&self) -> &ModelInfo;

    fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError>;

    /// One embedding per input, same order. Models that batch natively
    /// should override this.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EmbeddingError> {
        texts.iter().map(|text| self.embed(text)).collect()
    }
}
