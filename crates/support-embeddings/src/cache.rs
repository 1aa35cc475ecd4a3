//! Model files on local disk.
//!
//! Files live in an hf-hub cache directory and are fetched from the
//! HuggingFace Hub the first time a repository is used.

use std::path::{Path, PathBuf};

use hf_hub::api::sync::ApiBuilder;
use hf_hub::{Cache, Repo};
use tracing::{debug, info};

use crate::error::EmbeddingError;

pub const DEFAULT_MODEL_REPO: &str = "BAAI/bge-small-en-v1.5";

const CONFIG_FILE: &str = "config.json";
const TOKENIZER_FILE: &str = "tokenizer.json";
const WEIGHTS_FILE: &str = "model.safetensors";

/// Platform cache directory for downloaded models.
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("support-desk")
        .join("models")
}

/// Local paths of everything needed to run a BERT model.
#[derive(Debug, Clone)]
pub struct ModelFiles {
    pub config: PathBuf,
    pub tokenizer: PathBuf,
    pub weights: PathBuf,
}

/// One model repository inside a cache directory.
#[derive(Debug, Clone)]
pub struct ModelCache {
    cache_dir: PathBuf,
    repo_id: String,
}

impl Default for ModelCache {
    fn default() -> Self {
        Self::for_repo(DEFAULT_MODEL_REPO)
    }
}

impl ModelCache {
    pub fn new(cache_dir: impl Into<PathBuf>, repo_id: impl Into<String>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            repo_id: repo_id.into(),
        }
    }

    /// `repo_id` in the default cache directory.
    pub fn for_repo(repo_id: impl Into<String>) -> Self {
        Self::new(default_cache_dir(), repo_id)
    }

    pub fn repo_id(&self) -> &str {
        &self.repo_id
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Repository name without the owner, e.g. "bge-small-en-v1.5".
    pub fn model_name(&self) -> &str {
        self.repo_id
            .rsplit('/')
            .next()
            .unwrap_or(&self.repo_id)
    }

    /// Files already on disk. Never touches the network.
    pub fn cached(&self) -> Option<ModelFiles> {
        let repo = Cache::new(self.cache_dir.clone()).repo(Repo::model(self.repo_id.clone()));
        Some(ModelFiles {
            config: repo.get(CONFIG_FILE)?,
            tokenizer: repo.get(TOKENIZER_FILE)?,
            weights: repo.get(WEIGHTS_FILE)?,
        })
    }

    /// Cached files, downloading them first if any is missing.
    pub fn fetch(&self) -> Result<ModelFiles, EmbeddingError> {
        if let Some(files) = self.cached() {
            debug!(repo = %self.repo_id, "Using cached model files");
            return Ok(files);
        }

        info!(repo = %self.repo_id, dir = ?self.cache_dir, "Downloading model files");
        let api = ApiBuilder::new()
            .with_cache_dir(self.cache_dir.clone())
            .with_progress(false)
            .build()
            .map_err(|e| self.download_error("(hub client)", e))?;
        let repo = api.repo(Repo::model(self.repo_id.clone()));

        let get = |file: &str| {
            let path = repo.get(file).map_err(|e| self.download_error(file, e))?;
            debug!(file, "Fetched");
            Ok::<_, EmbeddingError>(path)
        };

        Ok(ModelFiles {
            config: get(CONFIG_FILE)?,
            tokenizer: get(TOKENIZER_FILE)?,
            weights: get(WEIGHTS_FILE)?,
        })
    }

    fn download_error(&self, file: &str, reason: impl std::fmt::Display) -> EmbeddingError {
        EmbeddingError::Download {
            repo: self.repo_id.clone(),
            file: file.to_string(),
            reason: reason.to_string(),
        }
    }
}
