//! BERT sentence embeddings with Candle.
//!
//! Runs on CPU. The default model is bge-small-en-v1.5 (384 dimensions,
//! [CLS] pooling); sentence-transformers models such as all-MiniLM-L6-v2 work
//! with mean pooling.

use std::path::Path;

use candle_core::{DType, Device, IndexOp, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};
use tracing::{debug, info};

use support_types::PoolingStrategy;

use crate::cache::{ModelCache, ModelFiles};
use crate::error::EmbeddingError;
use crate::model::{Embedding, EmbeddingModel, ModelInfo};

/// BERT position embedding limit
pub const MAX_TOKENS: usize = 512;

pub struct CandleEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    pooling: PoolingStrategy,
    info: ModelInfo,
}

impl CandleEmbedder {
    /// Load the cached model, downloading it on first use.
    pub fn load(cache: &ModelCache, pooling: PoolingStrategy) -> Result<Self, EmbeddingError> {
        let files = cache.fetch()?;
        Self::from_files(cache.model_name(), &files, pooling)
    }

    /// bge-small-en-v1.5 from the default cache.
    pub fn load_default() -> Result<Self, EmbeddingError> {
        Self::load(&ModelCache::default(), PoolingStrategy::Cls)
    }

    pub fn from_files(
        name: impl Into<String>,
        files: &ModelFiles,
        pooling: PoolingStrategy,
    ) -> Result<Self, EmbeddingError> {
        let name = name.into();
        let device = Device::Cpu;

        let (config, dimension) = read_config(&files.config)?;
        let tokenizer = load_tokenizer(&files.tokenizer)?;

        // SAFETY: the weights file is not modified while mapped
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(
                std::slice::from_ref(&files.weights),
                DType::F32,
                &device,
            )?
        };
        let model = BertModel::load(vb, &config)?;

        info!(model = %name, dim = dimension, ?pooling, "Embedding model loaded");

        Ok(Self {
            model,
            tokenizer,
            device,
            pooling,
            info: ModelInfo {
                name,
                dimension,
                max_tokens: MAX_TOKENS,
            },
        })
    }
}

/// Parse config.json into a BERT config plus its `hidden_size`.
fn read_config(path: &Path) -> Result<(BertConfig, usize), EmbeddingError> {
    let invalid = |reason: String| EmbeddingError::InvalidConfig {
        path: path.to_path_buf(),
        reason,
    };

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(path)?).map_err(|e| invalid(e.to_string()))?;
    let dimension = hidden_size(&raw).ok_or_else(|| invalid("missing hidden_size".to_string()))?;
    let config = serde_json::from_value(raw).map_err(|e| invalid(e.to_string()))?;

    Ok((config, dimension))
}

fn hidden_size(config: &serde_json::Value) -> Option<usize> {
    config
        .get("hidden_size")?
        .as_u64()
        .and_then(|v| usize::try_from(v).ok())
}

/// Tokenizer that pads each batch to its longest input and truncates at
/// [`MAX_TOKENS`].
fn load_tokenizer(path: &Path) -> Result<Tokenizer, EmbeddingError> {
    let mut tokenizer =
        Tokenizer::from_file(path).map_err(|e| EmbeddingError::Tokenizer(e.to_string()))?;

    tokenizer.with_padding(Some(PaddingParams {
        strategy: PaddingStrategy::BatchLongest,
        ..Default::default()
    }));
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length: MAX_TOKENS,
            ..Default::default()
        }))
        .map_err(|e| EmbeddingError::Tokenizer(e.to_string()))?;

    Ok(tokenizer)
}

/// Average of token vectors, ignoring padding.
fn mean_pool(hidden: &Tensor, mask: &Tensor) -> candle_core::Result<Tensor> {
    // (batch, tokens, 1) so it broadcasts over the hidden dimension
    let mask = mask.to_dtype(DType::F32)?.unsqueeze(2)?;
    let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
    let counts = mask.sum(1)?.clamp(1e-9, f64::MAX)?;
    summed.broadcast_div(&counts)
}

impl EmbeddingModel for CandleEmbedder {
    fn info(&self) -> &ModelInfo {
        &self.info
    }

    fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        self.embed_batch(&[text])?
            .pop()
            .ok_or_else(|| EmbeddingError::InvalidInput("model returned no embedding".to_string()))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| EmbeddingError::Tokenizer(e.to_string()))?;

        let mut ids = Vec::with_capacity(encodings.len());
        let mut masks = Vec::with_capacity(encodings.len());
        for encoding in &encodings {
            ids.push(Tensor::new(encoding.get_ids(), &self.device)?);
            masks.push(Tensor::new(encoding.get_attention_mask(), &self.device)?);
        }
        let input_ids = Tensor::stack(&ids, 0)?;
        let attention_mask = Tensor::stack(&masks, 0)?;
        let token_type_ids = input_ids.zeros_like()?;

        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;

        let pooled = match self.pooling {
            // [CLS] is the first token
            PoolingStrategy::Cls => hidden.i((.., 0))?,
            PoolingStrategy::Mean => mean_pool(&hidden, &attention_mask)?,
        };

        let rows: Vec<Vec<f32>> = pooled.to_vec2()?;
        debug!(count = rows.len(), tokens = input_ids.dim(1)?, "Embedded batch");

        Ok(rows.into_iter().map(Embedding::new).collect())
    }
}
