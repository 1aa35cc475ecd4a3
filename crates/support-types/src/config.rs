//! Configuration loading for support-desk.
//!
//! Layered config: defaults -> config file -> CLI config file -> env vars -> CLI flags.
//! The default config file lives at ~/.config/support-desk/config.{toml,json,yaml}.

use std::path::PathBuf;

use config::{Config, Environment, File};
use directories::ProjectDirs;
use secrecy::SecretString;
use serde::Deserialize;

use crate::error::SettingsError;

/// Session id used for callers that omit one under [`AnonymousSessionPolicy::Shared`].
pub const DEFAULT_SESSION_ID: &str = "default-session";

/// Pooling applied to the transformer's token embeddings.
#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PoolingStrategy {
    /// First ([CLS]) token, used by the BGE family
    #[default]
    Cls,
    /// Attention-masked mean over all tokens, used by sentence-transformers MiniLM
    Mean,
}

/// Embedding model configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingSettings {
    /// HuggingFace repository of the BERT-style model
    #[serde(default = "default_model_repo")]
    pub model_repo: String,

    #[serde(default)]
    pub pooling: PoolingStrategy,

    /// Override for the model file cache directory
    #[serde(default)]
    pub cache_dir: Option<String>,
}

fn default_model_repo() -> String {
    "BAAI/bge-small-en-v1.5".to_string()
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model_repo: default_model_repo(),
            pooling: PoolingStrategy::default(),
            cache_dir: None,
        }
    }
}

/// Retrieval configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RetrievalSettings {
    /// Minimum cosine similarity for the best match to count as grounding.
    /// Unset means any match is used.
    #[serde(default)]
    pub min_score: Option<f32>,
}

/// LLM provider wire format and defaults
#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    /// Groq (OpenAI-compatible API)
    #[default]
    Groq,
    /// OpenAI or any OpenAI-compatible endpoint
    #[serde(alias = "openai")]
    OpenAi,
    /// Anthropic messages API
    Anthropic,
}

impl LlmProvider {
    pub fn default_base_url(&self) -> &'static str {
        match self {
            LlmProvider::Groq => "https://api.groq.com/openai/v1",
            LlmProvider::OpenAi => "https://api.openai.com/v1",
            LlmProvider::Anthropic => "https://api.anthropic.com/v1",
        }
    }
}

/// LLM client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSettings {
    #[serde(default)]
    pub provider: LlmProvider,

    #[serde(default = "default_llm_model")]
    pub model: String,

    /// API base URL (for custom endpoints); provider default when unset
    #[serde(default)]
    pub base_url: Option<String>,

    /// API key, supplied via env (SUPPORT_LLM__API_KEY), never logged
    #[serde(default)]
    pub api_key: Option<SecretString>,

    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    /// Retries after the first attempt, at most [`MAX_LLM_RETRIES`]
    #[serde(default = "default_llm_retries")]
    pub max_retries: u32,

    #[serde(default)]
    pub temperature: f32,
}

fn default_llm_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}

fn default_llm_timeout() -> u64 {
    60
}

/// A failed answer is retried once before the error reaches the caller.
pub const MAX_LLM_RETRIES: u32 = 1;

fn default_llm_retries() -> u32 {
    MAX_LLM_RETRIES
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            model: default_llm_model(),
            base_url: None,
            api_key: None,
            timeout_secs: default_llm_timeout(),
            max_retries: default_llm_retries(),
            temperature: 0.0,
        }
    }
}

impl LlmSettings {
    /// Base URL to use, falling back to the provider default.
    pub fn effective_base_url(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| self.provider.default_base_url().to_string())
    }
}

/// Session history retention.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    /// Idle time after which a session is dropped
    #[serde(default = "default_session_ttl")]
    pub ttl_secs: u64,

    /// Maximum live sessions; least recently used is evicted beyond this
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Maximum turns kept per session (oldest dropped first)
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,

    /// How often the background sweeper purges expired sessions
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

fn default_session_ttl() -> u64 {
    30 * 60
}

fn default_max_sessions() -> usize {
    10_000
}

fn default_max_turns() -> usize {
    20
}

fn default_sweep_interval() -> u64 {
    60
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            ttl_secs: default_session_ttl(),
            max_sessions: default_max_sessions(),
            max_turns: default_max_turns(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

/// What to do with chat requests that carry no session id.
#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnonymousSessionPolicy {
    /// Give each anonymous request a fresh server-generated session id
    #[default]
    Generate,
    /// Share one history across all anonymous callers
    Shared,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatSettings {
    #[serde(default)]
    pub anonymous_sessions: AnonymousSessionPolicy,
}

/// Main application settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "default_http_host")]
    pub http_host: String,

    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Path to the JSON knowledge base
    #[serde(default = "default_knowledge_base_path")]
    pub knowledge_base_path: String,

    #[serde(default)]
    pub embedding: EmbeddingSettings,

    #[serde(default)]
    pub retrieval: RetrievalSettings,

    #[serde(default)]
    pub llm: LlmSettings,

    #[serde(default)]
    pub sessions: SessionSettings,

    #[serde(default)]
    pub chat: ChatSettings,
}

fn default_http_host() -> String {
    "127.0.0.1".to_string()
}

fn default_http_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_knowledge_base_path() -> String {
    "data.json".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            http_host: default_http_host(),
            http_port: default_http_port(),
            log_level: default_log_level(),
            knowledge_base_path: default_knowledge_base_path(),
            embedding: EmbeddingSettings::default(),
            retrieval: RetrievalSettings::default(),
            llm: LlmSettings::default(),
            sessions: SessionSettings::default(),
            chat: ChatSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/support-desk/config.*)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (SUPPORT_*, nested keys joined with `__`)
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, SettingsError> {
        let config_dir = ProjectDirs::from("", "", "support-desk")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("http_host", default_http_host())?
            .set_default("http_port", default_http_port() as i64)?
            .set_default("log_level", default_log_level())?
            .set_default("knowledge_base_path", default_knowledge_base_path())?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // SUPPORT_HTTP_PORT, SUPPORT_LLM__API_KEY, SUPPORT_SESSIONS__TTL_SECS, ...
        builder = builder.add_source(
            Environment::with_prefix("SUPPORT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if let Some(min_score) = self.retrieval.min_score {
            if !(-1.0..=1.0).contains(&min_score) {
                return Err(SettingsError::Invalid(format!(
                    "retrieval.min_score must be -1.0..=1.0, got {}",
                    min_score
                )));
            }
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(SettingsError::Invalid(format!(
                "llm.temperature must be 0.0..=2.0, got {}",
                self.llm.temperature
            )));
        }
        if self.llm.max_retries > MAX_LLM_RETRIES {
            return Err(SettingsError::Invalid(format!(
                "llm.max_retries must be at most {}, got {}",
                MAX_LLM_RETRIES, self.llm.max_retries
            )));
        }
        if self.llm.timeout_secs == 0 {
            return Err(SettingsError::Invalid(
                "llm.timeout_secs must be > 0".to_string(),
            ));
        }
        if self.sessions.max_sessions == 0 {
            return Err(SettingsError::Invalid(
                "sessions.max_sessions must be > 0".to_string(),
            ));
        }
        if self.sessions.max_turns < 2 {
            return Err(SettingsError::Invalid(
                "sessions.max_turns must hold at least one exchange (>= 2)".to_string(),
            ));
        }
        Ok(())
    }

    /// Socket address string for the HTTP server
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}
