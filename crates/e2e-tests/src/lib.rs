//! End-to-end test infrastructure for Support Desk.
//!
//! Provides a shared TestHarness that writes a knowledge base to disk, loads
//! and indexes it, and serves the full HTTP router in-process. The embedder is
//! the deterministic [`HashEmbedder`] and the LLM is a call-recording
//! [`MockChatModel`], so nothing touches the network.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use support_agent::{AgentConfig, SessionStore, SupportAgent};
use support_embeddings::HashEmbedder;
use support_index::FaqIndex;
use support_llm::MockChatModel;
use support_service::{app, AppState};
use support_types::{load_knowledge_base, AnonymousSessionPolicy, FaqEntry};

/// Shared test harness for E2E tests.
pub struct TestHarness {
    /// Keeps temp dir alive for the lifetime of the harness
    pub _temp_dir: tempfile::TempDir,
    pub index: Arc<FaqIndex>,
    pub llm: Arc<MockChatModel>,
    pub agent: Arc<SupportAgent>,
    pub app: Router,
}

impl TestHarness {
    /// Harness over the given knowledge base, generating anonymous sessions.
    pub fn new(entries: &[FaqEntry]) -> Self {
        Self::with_options(entries, AgentConfig::default(), AnonymousSessionPolicy::Generate)
    }

    pub fn with_options(
        entries: &[FaqEntry],
        config: AgentConfig,
        policy: AnonymousSessionPolicy,
    ) -> Self {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let kb_path = temp_dir.path().join("data.json");
        let raw = serde_json::to_string_pretty(entries).expect("Failed to serialize FAQ");
        std::fs::write(&kb_path, raw).expect("Failed to write knowledge base");

        let loaded = load_knowledge_base(&kb_path).expect("Failed to load knowledge base");
        let index = Arc::new(
            FaqIndex::build(loaded, Arc::new(HashEmbedder::default()))
                .expect("Failed to build index"),
        );

        let llm = Arc::new(MockChatModel::new());
        let agent = Arc::new(SupportAgent::new(
            index.clone(),
            llm.clone(),
            Arc::new(SessionStore::default()),
            config,
        ));
        let app = app(AppState::new(agent.clone(), policy));

        Self {
            _temp_dir: temp_dir,
            index,
            llm,
            agent,
            app,
        }
    }

    /// POST a raw body to `/chat/`.
    pub async fn post_chat_raw(&self, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/chat/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("Failed to build request");
        self.send(request).await
    }

    /// POST a JSON value to `/chat/`.
    pub async fn post_chat(&self, body: Value) -> (StatusCode, Value) {
        self.post_chat_raw(&body.to_string()).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::get(uri)
            .body(Body::empty())
            .expect("Failed to build request");
        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Router is infallible");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("Response is not JSON")
        };
        (status, body)
    }
}

/// Small bilingual knowledge base used across tests.
pub fn sample_faq() -> Vec<FaqEntry> {
    vec![
        FaqEntry::new(
            "How do I reset my password?",
            "Use the Forgot Password link.",
        ),
        FaqEntry::new(
            "How long does shipping take?",
            "Orders arrive within 3-5 business days.",
        ),
        FaqEntry::new(
            "Can I cancel my subscription?",
            "Yes, cancel any time from the Billing page.",
        ),
        FaqEntry::new(
            "営業時間は何時ですか？",
            "平日の午前9時から午後6時までです。",
        ),
    ]
}
