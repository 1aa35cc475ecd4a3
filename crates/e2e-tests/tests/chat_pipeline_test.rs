//! Full pipeline: HTTP request -> retrieval -> grounded prompt -> LLM -> history.

use pretty_assertions::assert_eq;
use serde_json::json;

use e2e_tests::{sample_faq, TestHarness};
use support_llm::ChatRole;
use support_types::FaqEntry;

/// Two-turn conversation on one session against a one-entry knowledge base.
#[tokio::test]
async fn test_two_turn_conversation() {
    let harness = TestHarness::new(&[FaqEntry::new(
        "How do I reset my password?",
        "Use the Forgot Password link.",
    )]);

    let (status, body) = harness
        .post_chat(json!({
            "message": "How do I reset my password?",
            "session_id": "s1",
        }))
        .await;

    assert_eq!(status.as_u16(), 200);
    assert!(!body["response"].as_str().unwrap().is_empty());
    assert_eq!(body["session_id"], "s1");

    let first_call = harness.llm.last_call().unwrap();
    assert_eq!(first_call.len(), 2);
    assert_eq!(first_call[0].role, ChatRole::System);
    assert!(first_call[0]
        .content
        .contains("Question: How do I reset my password?"));
    assert!(first_call[0]
        .content
        .contains("Answer: Use the Forgot Password link."));
    let first_reply = body["response"].as_str().unwrap().to_string();

    let (status, _) = harness
        .post_chat(json!({
            "message": "What if I no longer have access to my email?",
            "session_id": "s1",
        }))
        .await;
    assert_eq!(status.as_u16(), 200);

    let second_call = harness.llm.last_call().unwrap();
    let contents: Vec<&str> = second_call.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents.len(), 4);
    assert_eq!(contents[1], "How do I reset my password?");
    assert_eq!(contents[2], first_reply);
    assert_eq!(contents[3], "What if I no longer have access to my email?");
    assert_eq!(harness.llm.call_count(), 2);
}

/// Searching with a stored question returns that exact entry as the best match.
#[tokio::test]
async fn test_exact_question_is_top_match() {
    let faq = sample_faq();
    let harness = TestHarness::new(&faq);

    for entry in &faq {
        let matches = harness.index.search(&entry.question, 1).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(&matches[0].entry, entry);
        assert!(matches[0].score > 0.99, "score {}", matches[0].score);
    }
}

/// `search` never returns more than k results, best first.
#[tokio::test]
async fn test_search_respects_k_and_order() {
    let harness = TestHarness::new(&sample_faq());

    let matches = harness
        .index
        .search("How long does shipping take?", 3)
        .unwrap();
    assert_eq!(matches.len(), 3);
    assert_eq!(matches[0].entry.question, "How long does shipping take?");
    assert!(matches.windows(2).all(|w| w[0].score >= w[1].score));

    let all = harness.index.search("password", 10).unwrap();
    assert!(all.len() <= 4);
}

/// Japanese questions retrieve the Japanese entry and the reply comes back verbatim.
#[tokio::test]
async fn test_japanese_question() {
    let harness = TestHarness::new(&sample_faq());
    harness.llm.push_reply("平日の午前9時から午後6時までです。");

    let (status, body) = harness
        .post_chat(json!({ "message": "営業時間は何時ですか？", "session_id": "jp" }))
        .await;

    assert_eq!(status.as_u16(), 200);
    assert_eq!(body["response"], "平日の午前9時から午後6時までです。");
    let call = harness.llm.last_call().unwrap();
    assert!(call[0].content.contains("Question: 営業時間は何時ですか？"));
}

/// Conversation history is readable over HTTP after a chat.
#[tokio::test]
async fn test_history_endpoint_reflects_conversation() {
    let harness = TestHarness::new(&sample_faq());
    harness
        .post_chat(json!({ "message": "Can I cancel my subscription?", "session_id": "h1" }))
        .await;

    let (status, body) = harness.get("/chat/h1/history").await;
    assert_eq!(status.as_u16(), 200);

    let turns = body["turns"].as_array().unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0]["role"], "human");
    assert_eq!(turns[0]["content"], "Can I cancel my subscription?");
    assert_eq!(turns[1]["role"], "assistant");
}
