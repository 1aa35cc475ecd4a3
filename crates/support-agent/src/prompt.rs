//! Prompt construction for grounded answers.

use support_llm::ChatMessage;
use support_types::{FaqEntry, Turn};

/// Reply used when no FAQ entry matches. Japanese first, then English.
pub const FALLBACK_MESSAGE: &str = "申し訳ありませんが、この質問の情報は見つかりませんでした。サポートチームにお問い合わせください。\nI'm sorry, I couldn't find an answer. Please contact our customer support team.";

/// System instruction grounding the model in a single FAQ entry.
pub fn system_prompt(entry: &FaqEntry) -> String {
    format!(
        r#"You are a customer support agent. Help the user using only the FAQ entry provided below.
Answer politely and concisely so the reply is quick to read.
Always reply in the same language as the user's question: if the question is in Japanese, answer in Japanese; if it is in English, answer in English.
Do not make up information. If the FAQ entry does not answer the question, politely suggest contacting the support team.
Format the reply using Markdown.

FAQ entry:
Question: {question}
Answer: {answer}"#,
        question = entry.question,
        answer = entry.answer,
    )
}

/// System instruction, then prior turns oldest first, then the new question.
pub fn build_messages(entry: &FaqEntry, history: &[Turn], user_text: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(system_prompt(entry)));
    messages.extend(history.iter().map(ChatMessage::from));
    messages.push(ChatMessage::user(user_text));
    messages
}
