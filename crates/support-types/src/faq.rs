//! FAQ entry type.

use serde::{Deserialize, Serialize};

/// A single question/answer pair from the knowledge base.
///
/// Immutable once loaded. The question is what gets embedded and searched;
/// the answer is only ever shown to the LLM as grounding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqEntry {
    pub question: String,
    pub answer: String,
}

impl FaqEntry {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}
