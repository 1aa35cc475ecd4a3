//! Error paths: client input errors, upstream failures, and fatal startup errors.
//!
//! No test should cause a panic inside the service.

use pretty_assertions::assert_eq;
use serde_json::json;

use e2e_tests::{sample_faq, TestHarness};
use support_llm::LlmError;
use support_types::{load_knowledge_base, KnowledgeBaseError};

#[tokio::test]
async fn test_ping_has_no_side_effects() {
    let harness = TestHarness::new(&sample_faq());

    for _ in 0..3 {
        let (status, body) = harness.get("/ping").await;
        assert_eq!(status.as_u16(), 200);
        assert_eq!(body, json!({ "status": "ok" }));
    }
    assert!(harness.agent.sessions().is_empty());
    assert_eq!(harness.llm.call_count(), 0);
}

#[tokio::test]
async fn test_missing_message_is_400() {
    let harness = TestHarness::new(&sample_faq());

    let (status, body) = harness.post_chat(json!({ "session_id": "s1" })).await;

    assert_eq!(status.as_u16(), 400);
    assert_eq!(body, json!({ "error": "No message provided." }));
    assert_eq!(harness.llm.call_count(), 0);
    assert!(harness.agent.sessions().is_empty());
}

#[tokio::test]
async fn test_malformed_body_is_400() {
    let harness = TestHarness::new(&sample_faq());

    let (status, body) = harness.post_chat_raw(r#"{"message": "unterminated"#).await;

    assert_eq!(status.as_u16(), 400);
    assert!(body["error"].is_string());
    assert_eq!(harness.llm.call_count(), 0);
}

#[tokio::test]
async fn test_llm_auth_failure_is_500_not_retryable() {
    let harness = TestHarness::new(&sample_faq());
    harness.llm.push_error(LlmError::Status {
        status: 401,
        body: "Invalid API Key".to_string(),
    });

    let (status, body) = harness
        .post_chat(json!({ "message": "How do I reset my password?", "session_id": "s1" }))
        .await;

    assert_eq!(status.as_u16(), 500);
    assert!(body["error"].as_str().unwrap().contains("Invalid API Key"));
    assert_eq!(body["kind"], "llm");
    assert_eq!(body["retryable"], false);

    // Failed turn is not recorded
    let (_, history) = harness.get("/chat/s1/history").await;
    assert_eq!(history["turns"], json!([]));
}

#[tokio::test]
async fn test_rate_limit_is_500_retryable() {
    let harness = TestHarness::new(&sample_faq());
    harness.llm.push_error(LlmError::RateLimitExceeded);

    let (status, body) = harness
        .post_chat(json!({ "message": "How long does shipping take?" }))
        .await;

    assert_eq!(status.as_u16(), 500);
    assert_eq!(body["retryable"], true);
}

#[test]
fn test_malformed_knowledge_base_is_fatal() {
    let dir = tempfile::TempDir::new().unwrap();

    let missing = dir.path().join("missing.json");
    assert!(matches!(
        load_knowledge_base(&missing),
        Err(KnowledgeBaseError::Io { .. })
    ));

    let broken = dir.path().join("broken.json");
    std::fs::write(&broken, r#"[{"question": "q"}]"#).unwrap();
    assert!(load_knowledge_base(&broken).is_err());
}
