//! HTTP chat model for OpenAI-compatible endpoints (Groq, OpenAI) and Anthropic.

use std::time::Duration;

use async_trait::async_trait;
use backoff::{backoff::Backoff, ExponentialBackoff};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use support_types::{LlmProvider, LlmSettings};

use crate::error::LlmError;
use crate::message::{ChatMessage, ChatRole};
use crate::ChatModel;

/// Configuration for the HTTP chat model.
#[derive(Debug, Clone)]
pub struct ApiChatModelConfig {
    /// Wire format to speak
    pub provider: LlmProvider,

    /// API base URL (e.g., "https://api.groq.com/openai/v1")
    pub base_url: String,

    /// Model to use (e.g., "llama-3.3-70b-versatile")
    pub model: String,

    pub api_key: SecretString,

    /// Sampling temperature; 0.0 for the most literal output
    pub temperature: f32,

    /// Request timeout
    pub timeout: Duration,

    /// Retries after the first attempt, transient failures only
    pub max_retries: u32,

    /// First backoff delay between attempts
    pub retry_initial_interval: Duration,

    /// Completion length cap (required by Anthropic)
    pub max_tokens: u32,
}

impl ApiChatModelConfig {
    fn with_provider(
        provider: LlmProvider,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            base_url: provider.default_base_url().to_string(),
            model: model.into(),
            api_key: SecretString::from(api_key.into()),
            temperature: 0.0,
            timeout: Duration::from_secs(60),
            max_retries: 1,
            retry_initial_interval: Duration::from_millis(500),
            max_tokens: 1024,
        }
    }

    /// Create config for the Groq API.
    pub fn groq(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_provider(LlmProvider::Groq, api_key, model)
    }

    /// Create config for the OpenAI API.
    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_provider(LlmProvider::OpenAi, api_key, model)
    }

    /// Create config for the Claude API.
    pub fn claude(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_provider(LlmProvider::Anthropic, api_key, model)
    }

    /// Build from loaded settings. The API key must be present.
    pub fn from_settings(settings: &LlmSettings) -> Result<Self, LlmError> {
        let api_key = settings.api_key.clone().ok_or_else(|| {
            LlmError::Config(
                "LLM API key not configured (set SUPPORT_LLM__API_KEY)".to_string(),
            )
        })?;

        Ok(Self {
            provider: settings.provider,
            base_url: settings.effective_base_url(),
            model: settings.model.clone(),
            api_key,
            temperature: settings.temperature,
            timeout: Duration::from_secs(settings.timeout_secs),
            max_retries: settings.max_retries,
            retry_initial_interval: Duration::from_millis(500),
            max_tokens: 1024,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_initial_interval = interval;
        self
    }
}

/// Chat model backed by a hosted completion API.
pub struct ApiChatModel {
    client: Client,
    config: ApiChatModelConfig,
}

impl ApiChatModel {
    pub fn new(config: ApiChatModelConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Config(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ApiChatModelConfig {
        &self.config
    }

    /// Call the API, retrying transient failures up to `max_retries` times.
    async fn call_api(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let mut backoff = ExponentialBackoff {
            initial_interval: self.config.retry_initial_interval,
            max_elapsed_time: Some(Duration::from_secs(120)),
            ..Default::default()
        };

        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            debug!(attempt = attempts, model = %self.config.model, "Calling chat API");

            match self.make_request(messages).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    if !e.is_retryable() {
                        error!(error = %e, "Chat API call failed");
                        return Err(e);
                    }
                    if attempts > self.config.max_retries {
                        error!(error = %e, attempts, "Max retries exceeded");
                        return Err(e);
                    }

                    match backoff.next_backoff() {
                        Some(duration) => {
                            warn!(
                                error = %e,
                                retry_in_ms = duration.as_millis(),
                                "Chat API call failed, retrying"
                            );
                            tokio::time::sleep(duration).await;
                        }
                        None => {
                            error!(error = %e, "Backoff exhausted");
                            return Err(e);
                        }
                    }
                }
            }
        }
    }

    async fn make_request(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        match self.config.provider {
            LlmProvider::Anthropic => self.make_anthropic_request(messages).await,
            LlmProvider::Groq | LlmProvider::OpenAi => self.make_openai_request(messages).await,
        }
    }

    /// Make OpenAI-compatible API request.
    async fn make_openai_request(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        #[derive(Serialize)]
        struct OpenAIRequest<'a> {
            model: &'a str,
            messages: &'a [ChatMessage],
            temperature: f32,
        }

        #[derive(Deserialize)]
        struct OpenAIResponse {
            choices: Vec<OpenAIChoice>,
        }

        #[derive(Deserialize)]
        struct OpenAIChoice {
            message: OpenAIMessageResponse,
        }

        #[derive(Deserialize)]
        struct OpenAIMessageResponse {
            content: Option<String>,
        }

        let request = OpenAIRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
        };

        let url = format!("{}/chat/completions", self.config.base_url);

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.config.api_key.expose_secret()),
            )
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let response = check_status(response).await?;

        let response_body: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        response_body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::Parse("No choices in response".to_string()))
    }

    /// Make Anthropic API request. System messages go in the top-level `system` field.
    async fn make_anthropic_request(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        #[derive(Serialize)]
        struct AnthropicRequest<'a> {
            model: &'a str,
            max_tokens: u32,
            temperature: f32,
            #[serde(skip_serializing_if = "Option::is_none")]
            system: Option<String>,
            messages: Vec<AnthropicMessage<'a>>,
        }

        #[derive(Serialize)]
        struct AnthropicMessage<'a> {
            role: &'static str,
            content: &'a str,
        }

        #[derive(Deserialize)]
        struct AnthropicResponse {
            content: Vec<AnthropicContent>,
        }

        #[derive(Deserialize)]
        struct AnthropicContent {
            #[serde(default)]
            text: String,
        }

        let system: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == ChatRole::System)
            .map(|m| m.content.as_str())
            .collect();

        let request = AnthropicRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            system: (!system.is_empty()).then(|| system.join("\n\n")),
            messages: messages
                .iter()
                .filter(|m| m.role != ChatRole::System)
                .map(|m| AnthropicMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
        };

        let url = format!("{}/messages", self.config.base_url);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", self.config.api_key.expose_secret())
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let response = check_status(response).await?;

        let response_body: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        response_body
            .content
            .into_iter()
            .next()
            .map(|c| c.text)
            .ok_or_else(|| LlmError::Parse("No content in response".to_string()))
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, LlmError> {
    let status = response.status();
    if status.as_u16() == 429 {
        return Err(LlmError::RateLimitExceeded);
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(LlmError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}

#[async_trait]
impl ChatModel for ApiChatModel {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        if messages.is_empty() {
            return Err(LlmError::Config("No messages to send".to_string()));
        }
        self.call_api(messages).await
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_messages() -> Vec<ChatMessage> {
        vec![
            ChatMessage::system("You are a support agent."),
            ChatMessage::user("How do I reset my password?"),
        ]
    }

    fn groq_for(server: &MockServer) -> ApiChatModel {
        let config = ApiChatModelConfig::groq("test-key", "llama-3.3-70b-versatile")
            .with_base_url(server.uri())
            .with_retry_interval(Duration::from_millis(10));
        ApiChatModel::new(config).unwrap()
    }

    fn openai_reply(text: &str) -> serde_json::Value {
        json!({"choices": [{"message": {"role": "assistant", "content": text}}]})
    }

    #[test]
    fn test_groq_config() {
        let config = ApiChatModelConfig::groq("test-key", "llama-3.3-70b-versatile");
        assert!(config.base_url.contains("groq"));
        assert_eq!(config.temperature, 0.0);
        assert_eq!(config.max_retries, 1);
    }

    #[test]
    fn test_claude_config() {
        let config = ApiChatModelConfig::claude("test-key", "claude-3-haiku-20240307");
        assert!(config.base_url.contains("anthropic"));
        assert_eq!(config.provider, LlmProvider::Anthropic);
    }

    #[test]
    fn test_from_settings_requires_key() {
        let settings = LlmSettings::default();
        assert!(matches!(
            ApiChatModelConfig::from_settings(&settings),
            Err(LlmError::Config(_))
        ));

        let settings = LlmSettings {
            api_key: Some(SecretString::from("k".to_string())),
            ..Default::default()
        };
        let config = ApiChatModelConfig::from_settings(&settings).unwrap();
        assert_eq!(config.model, "llama-3.3-70b-versatile");
    }

    #[tokio::test]
    async fn test_openai_request_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "model": "llama-3.3-70b-versatile",
                "temperature": 0.0,
                "messages": [
                    {"role": "system", "content": "You are a support agent."},
                    {"role": "user", "content": "How do I reset my password?"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(openai_reply("Use the link.")))
            .expect(1)
            .mount(&server)
            .await;

        let reply = groq_for(&server).complete(&test_messages()).await.unwrap();
        assert_eq!(reply, "Use the link.");
    }

    #[tokio::test]
    async fn test_retries_once_then_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .expect(2)
            .mount(&server)
            .await;

        let result = groq_for(&server).complete(&test_messages()).await;
        assert!(matches!(result, Err(LlmError::Status { status: 503, .. })));
    }

    #[tokio::test]
    async fn test_retry_recovers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(openai_reply("Second time lucky")))
            .mount(&server)
            .await;

        let reply = groq_for(&server).complete(&test_messages()).await.unwrap();
        assert_eq!(reply, "Second time lucky");
    }

    #[tokio::test]
    async fn test_auth_failure_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .expect(1)
            .mount(&server)
            .await;

        let result = groq_for(&server).complete(&test_messages()).await;
        match result {
            Err(LlmError::Status { status, body }) => {
                assert_eq!(status, 401);
                assert!(body.contains("invalid api key"));
            }
            other => panic!("Expected 401 status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_choices_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let result = groq_for(&server).complete(&test_messages()).await;
        assert!(matches!(result, Err(LlmError::Parse(_))));
    }

    #[tokio::test]
    async fn test_anthropic_moves_system_prompt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .and(header("x-api-key", "test-key"))
            .and(body_partial_json(json!({
                "system": "You are a support agent.",
                "messages": [{"role": "user", "content": "How do I reset my password?"}]
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"content": [{"type": "text", "text": "Click Forgot Password."}]})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let config = ApiChatModelConfig::claude("test-key", "claude-3-haiku-20240307")
            .with_base_url(server.uri());
        let model = ApiChatModel::new(config).unwrap();

        let reply = model.complete(&test_messages()).await.unwrap();
        assert_eq!(reply, "Click Forgot Password.");
    }
}
