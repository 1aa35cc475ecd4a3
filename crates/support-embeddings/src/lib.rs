//! # support-embeddings
//!
//! Sentence embeddings for Support Desk.
//!
//! FAQ questions and user queries are embedded with the same model so they can
//! be compared by cosine similarity.
//!
//! ## Features
//! - Local inference via Candle (no Python, no embedding API)
//! - bge-small-en-v1.5 by default (384 dimensions, [CLS] pooling)
//! - Model files fetched from the HuggingFace Hub once, then cached
//! - Deterministic hashing embedder for tests that must not download a model

pub mod cache;
pub mod candle;
pub mod error;
pub mod hash;
pub mod model;

pub use crate::candle::CandleEmbedder;
pub use cache::{default_cache_dir, ModelCache, ModelFiles, DEFAULT_MODEL_REPO};
pub use error::EmbeddingError;
pub use hash::{HashEmbedder, DEFAULT_HASH_DIM};
pub use model::{Embedding, EmbeddingModel, ModelInfo};
