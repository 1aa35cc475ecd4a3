//! Deterministic feature-hashing embedder.
//!
//! Maps each token to a bucket with FNV-1a and counts occurrences. No model
//! files, no network, so tests never download a model.
//! Identical texts always get identical vectors; texts sharing words get
//! positive similarity.

use crate::error::EmbeddingError;
use crate::model::{Embedding, EmbeddingModel, ModelInfo};

/// Default dimension, matching bge-small-en-v1.5
pub const DEFAULT_HASH_DIM: usize = 384;

/// Bag-of-words embedder using the hashing trick.
pub struct HashEmbedder {
    info: ModelInfo,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Result<Self, EmbeddingError> {
        if dimension == 0 {
            return Err(EmbeddingError::InvalidInput(
                "dimension must be > 0".to_string(),
            ));
        }
        Ok(Self {
            info: ModelInfo {
                name: "feature-hash".to_string(),
                dimension,
                max_tokens: usize::MAX,
            },
        })
    }

    fn bucket(&self, token: &str) -> usize {
        (fnv1a(token.as_bytes()) % self.info.dimension as u64) as usize
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self {
            info: ModelInfo {
                name: "feature-hash".to_string(),
                dimension: DEFAULT_HASH_DIM,
                max_tokens: usize::MAX,
            },
        }
    }
}

impl EmbeddingModel for HashEmbedder {
    fn info(&self) -> &ModelInfo {
        &self.info
    }

    fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        let mut values = vec![0.0f32; self.info.dimension];
        for token in tokenize(text) {
            values[self.bucket(&token)] += 1.0;
        }
        Ok(Embedding::new(values))
    }
}

/// Lowercased ASCII words; every non-ASCII alphanumeric char (CJK) is its own token.
fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut word = String::new();

    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            word.push(c.to_ascii_lowercase());
            continue;
        }
        if !word.is_empty() {
            tokens.push(std::mem::take(&mut word));
        }
        if c.is_alphanumeric() {
            tokens.push(c.to_string());
        }
    }
    if !word.is_empty() {
        tokens.push(word);
    }

    tokens
}

fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    bytes
        .iter()
        .fold(OFFSET, |hash, b| (hash ^ u64::from(*b)).wrapping_mul(PRIME))
}
