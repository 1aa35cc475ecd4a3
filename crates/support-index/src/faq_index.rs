//! FAQ similarity index.
//!
//! Embeds every FAQ question once and answers "which stored questions are
//! closest to this text". Read-only after [`FaqIndex::build`], so it can be
//! shared across request handlers through an `Arc` without locking.

use std::sync::Arc;

use tracing::{debug, info};

use support_embeddings::{Embedding, EmbeddingModel};
use support_types::FaqEntry;

use crate::error::IndexError;
use crate::hnsw::{HnswConfig, HnswIndex};

/// One retrieved FAQ entry with its cosine similarity to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct FaqMatch {
    pub entry: FaqEntry,
    pub score: f32,
}

/// Knowledge base entries plus the vector index over their questions.
pub struct FaqIndex {
    /// Index position == position in this list
    entries: Vec<FaqEntry>,
    index: HnswIndex,
    embedder: Arc<dyn EmbeddingModel>,
}

impl FaqIndex {
    /// Build the index, embedding every question in one batch.
    pub fn build(
        entries: Vec<FaqEntry>,
        embedder: Arc<dyn EmbeddingModel>,
    ) -> Result<Self, IndexError> {
        let config = HnswConfig::new(embedder.info().dimension);
        Self::build_with_config(entries, embedder, &config)
    }

    pub fn build_with_config(
        entries: Vec<FaqEntry>,
        embedder: Arc<dyn EmbeddingModel>,
        config: &HnswConfig,
    ) -> Result<Self, IndexError> {
        let questions: Vec<&str> = entries.iter().map(|e| e.question.as_str()).collect();
        let embeddings = embedder.embed_batch(&questions)?;
        let index = HnswIndex::build(config, &embeddings)?;

        info!(
            entries = entries.len(),
            dim = index.dimension(),
            model = %embedder.info().name,
            "Built FAQ index"
        );

        Ok(Self {
            entries,
            index,
            embedder,
        })
    }

    /// Up to `k` entries most similar to `query`, best first.
    ///
    /// An empty index returns no matches without touching the embedder.
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<FaqMatch>, IndexError> {
        if self.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let embedding = self.embedder.embed(query)?;
        self.search_embedding(&embedding, k)
    }

    /// Search with a query that has already been embedded.
    pub fn search_embedding(
        &self,
        query: &Embedding,
        k: usize,
    ) -> Result<Vec<FaqMatch>, IndexError> {
        let matches: Vec<FaqMatch> = self
            .index
            .search(query, k)?
            .into_iter()
            .filter_map(|n| {
                self.entries.get(n.position).map(|entry| FaqMatch {
                    entry: entry.clone(),
                    score: n.score,
                })
            })
            .collect();

        debug!(k = k, found = matches.len(), "FAQ search complete");
        Ok(matches)
    }

    /// [`search`](Self::search) on the blocking pool, since embedding is CPU-bound.
    pub async fn search_blocking(
        self: &Arc<Self>,
        query: &str,
        k: usize,
    ) -> Result<Vec<FaqMatch>, IndexError> {
        if self.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let this = Arc::clone(self);
        let query = query.to_string();
        tokio::task::spawn_blocking(move || this.search(&query, k)).await?
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.index.dimension()
    }

    pub fn entries(&self) -> &[FaqEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use support_embeddings::HashEmbedder;

    fn sample_entries() -> Vec<FaqEntry> {
        vec![
            FaqEntry::new(
                "How do I reset my password?",
                "Use the Forgot Password link.",
            ),
            FaqEntry::new(
                "Where can I track my order?",
                "Open Order History and select the order.",
            ),
            FaqEntry::new(
                "Can I pay with a credit card?",
                "Visa, Mastercard and JCB are accepted.",
            ),
            FaqEntry::new("送料はいくらですか？", "全国一律500円です。"),
        ]
    }

    fn build(entries: Vec<FaqEntry>) -> FaqIndex {
        FaqIndex::build(entries, Arc::new(HashEmbedder::default())).unwrap()
    }

    #[test]
    fn test_identical_question_is_top_match() {
        let entries = sample_entries();
        let index = build(entries.clone());

        for entry in &entries {
            let matches = index.search(&entry.question, 1).unwrap();
            assert_eq!(matches.len(), 1);
            assert_eq!(&matches[0].entry, entry);
            assert!((matches[0].score - 1.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_results_ordered_and_bounded() {
        let index = build(sample_entries());
        let matches = index.search("track my order please", 3).unwrap();

        assert!(matches.len() <= 3);
        assert_eq!(matches[0].entry.question, "Where can I track my order?");
        for pair in matches.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_k_larger_than_index() {
        let index = build(sample_entries());
        let matches = index.search("password", 50).unwrap();
        assert!(matches.len() <= 4);
    }

    #[test]
    fn test_empty_index_returns_empty() {
        let index = build(Vec::new());
        assert!(index.is_empty());
        assert!(index.search("anything at all", 1).unwrap().is_empty());
        assert!(index.search("", 5).unwrap().is_empty());
    }

    #[test]
    fn test_zero_k_returns_empty() {
        let index = build(sample_entries());
        assert!(index.search("password", 0).unwrap().is_empty());
    }

    #[test]
    fn test_search_is_deterministic() {
        let index = build(sample_entries());
        let first = index.search("credit card payment", 2).unwrap();
        let second = index.search("credit card payment", 2).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_custom_graph_parameters() {
        let embedder: Arc<dyn EmbeddingModel> = Arc::new(HashEmbedder::default());
        let config = HnswConfig::new(embedder.info().dimension)
            .with_connectivity(8)
            .with_expansion(64, 32);
        let index = FaqIndex::build_with_config(sample_entries(), embedder, &config).unwrap();

        assert_eq!(index.len(), 4);
        assert_eq!(index.dimension(), 384);
        let best = index.search("Can I pay with a credit card?", 1).unwrap();
        assert_eq!(best[0].entry.answer, "Visa, Mastercard and JCB are accepted.");
    }

    #[test]
    fn test_embedder_dimension_mismatch() {
        let embedder: Arc<dyn EmbeddingModel> = Arc::new(HashEmbedder::new(16).unwrap());
        let result = FaqIndex::build_with_config(sample_entries(), embedder, &HnswConfig::new(32));
        assert!(matches!(result, Err(IndexError::DimensionMismatch { .. })));
    }

    #[tokio::test]
    async fn test_search_blocking() {
        let index = Arc::new(build(sample_entries()));
        let matches = index.search_blocking("送料はいくらですか？", 1).await.unwrap();
        assert_eq!(matches[0].entry.answer, "全国一律500円です。");
    }
}
