//! HNSW vector index over usearch.
//!
//! Built once from a complete batch of embeddings and never modified, so
//! searches need no locking. Vector keys are positions in the input batch.
//! Parameters favor recall over speed since FAQ sets are small:
//! - M = 16 (connections per layer)
//! - ef_construction = 200 (build-time quality)
//! - ef_search = 100 (search-time quality)

use support_embeddings::Embedding;
use tracing::debug;
use usearch::{Index, IndexOptions, MetricKind, ScalarKind};

use crate::error::IndexError;

#[derive(Debug, Clone)]
pub struct HnswConfig {
    /// Must match the embedding model
    pub dimension: usize,
    /// M
    pub connectivity: usize,
    /// ef_construction
    pub expansion_add: usize,
    /// ef_search
    pub expansion_search: usize,
}

impl HnswConfig {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            connectivity: 16,
            expansion_add: 200,
            expansion_search: 100,
        }
    }

    pub fn with_connectivity(mut self, m: usize) -> Self {
        self.connectivity = m;
        self
    }

    pub fn with_expansion(mut self, ef_add: usize, ef_search: usize) -> Self {
        self.expansion_add = ef_add;
        self.expansion_search = ef_search;
        self
    }
}

/// Position of a stored vector and its cosine similarity to the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub position: usize,
    pub score: f32,
}

pub struct HnswIndex {
    index: Index,
    dimension: usize,
}

fn usearch_err(e: impl std::fmt::Display) -> IndexError {
    IndexError::Index(e.to_string())
}

impl HnswIndex {
    /// Index `embeddings`, keyed by their position.
    pub fn build(config: &HnswConfig, embeddings: &[Embedding]) -> Result<Self, IndexError> {
        let options = IndexOptions {
            dimensions: config.dimension,
            metric: MetricKind::Cos,
            quantization: ScalarKind::F32,
            connectivity: config.connectivity,
            expansion_add: config.expansion_add,
            expansion_search: config.expansion_search,
            multi: false,
        };
        let index = Index::new(&options).map_err(usearch_err)?;
        index.reserve(embeddings.len().max(1)).map_err(usearch_err)?;

        let this = Self {
            index,
            dimension: config.dimension,
        };
        for (position, embedding) in embeddings.iter().enumerate() {
            this.check_dimension(embedding)?;
            this.index
                .add(position as u64, embedding.as_slice())
                .map_err(usearch_err)?;
        }

        debug!(dim = this.dimension, vectors = embeddings.len(), "Built HNSW index");
        Ok(this)
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.index.size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Up to `k` nearest stored vectors, most similar first.
    pub fn search(&self, query: &Embedding, k: usize) -> Result<Vec<Neighbor>, IndexError> {
        self.check_dimension(query)?;
        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let found = self
            .index
            .search(query.as_slice(), k)
            .map_err(usearch_err)?;

        // usearch reports cosine distance
        Ok(found
            .keys
            .iter()
            .zip(&found.distances)
            .map(|(&key, &distance)| Neighbor {
                position: key as usize,
                score: 1.0 - distance,
            })
            .collect())
    }

    fn check_dimension(&self, embedding: &Embedding) -> Result<(), IndexError> {
        if embedding.dimension() == self.dimension {
            Ok(())
        } else {
            Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.dimension(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn random_embeddings(n: usize, dim: usize) -> Vec<Embedding> {
        let mut rng = rand::rng();
        (0..n)
            .map(|_| Embedding::new((0..dim).map(|_| rng.random::<f32>() - 0.5).collect()))
            .collect()
    }

    #[test]
    fn test_build_and_search_sorted() {
        let vectors = random_embeddings(50, 64);
        let index = HnswIndex::build(&HnswConfig::new(64), &vectors).unwrap();
        assert_eq!(index.len(), 50);

        let query = &random_embeddings(1, 64)[0];
        let results = index.search(query, 5).unwrap();
        assert_eq!(results.len(), 5);
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_stored_vector_finds_itself() {
        let vectors = random_embeddings(20, 32);
        let index = HnswIndex::build(&HnswConfig::new(32), &vectors).unwrap();

        let best = index.search(&vectors[13], 1).unwrap();
        assert_eq!(best[0].position, 13);
        assert!((best[0].score - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_k_beyond_size() {
        let vectors = random_embeddings(3, 16);
        let index = HnswIndex::build(&HnswConfig::new(16), &vectors).unwrap();
        assert_eq!(index.search(&vectors[0], 10).unwrap().len(), 3);
    }

    #[test]
    fn test_empty_index() {
        let index = HnswIndex::build(&HnswConfig::new(16), &[]).unwrap();
        assert!(index.is_empty());
        let query = &random_embeddings(1, 16)[0];
        assert!(index.search(query, 3).unwrap().is_empty());
    }

    #[test]
    fn test_dimension_mismatch() {
        let result = HnswIndex::build(&HnswConfig::new(64), &random_embeddings(1, 32));
        assert!(matches!(
            result,
            Err(IndexError::DimensionMismatch {
                expected: 64,
                actual: 32
            })
        ));

        let index = HnswIndex::build(&HnswConfig::new(64), &random_embeddings(2, 64)).unwrap();
        assert!(index.search(&random_embeddings(1, 8)[0], 1).is_err());
    }
}
