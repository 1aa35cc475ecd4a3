//! # support-index
//!
//! In-memory similarity index over the FAQ knowledge base.
//!
//! Each FAQ question is embedded once at startup and stored in an HNSW
//! (Hierarchical Navigable Small World) index via usearch. Queries are
//! embedded with the same model and matched by cosine similarity.
//!
//! The index is rebuilt from the knowledge base on every start and never
//! persisted. It is immutable once built, so concurrent searches share it
//! freely.

pub mod error;
pub mod faq_index;
pub mod hnsw;

pub use error::IndexError;
pub use faq_index::{FaqIndex, FaqMatch};
pub use hnsw::{HnswConfig, HnswIndex, Neighbor};
