//! Knowledge base loading.
//!
//! The knowledge base is a JSON array of `{"question": .., "answer": ..}`
//! records, read once at startup. Any problem fails the whole load.

use std::path::Path;

use tracing::info;

use crate::error::KnowledgeBaseError;
use crate::faq::FaqEntry;

/// Load the knowledge base from a JSON file.
pub fn load_knowledge_base(path: impl AsRef<Path>) -> Result<Vec<FaqEntry>, KnowledgeBaseError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| KnowledgeBaseError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let entries = parse_knowledge_base(&raw)?;
    info!(path = ?path, entries = entries.len(), "Loaded knowledge base");
    Ok(entries)
}

/// Parse knowledge base records from inline JSON.
pub fn parse_knowledge_base(raw: &str) -> Result<Vec<FaqEntry>, KnowledgeBaseError> {
    let entries: Vec<FaqEntry> = serde_json::from_str(raw)?;

    for (index, entry) in entries.iter().enumerate() {
        if entry.question.trim().is_empty() {
            return Err(KnowledgeBaseError::InvalidEntry {
                index,
                reason: "question is empty".to_string(),
            });
        }
        if entry.answer.trim().is_empty() {
            return Err(KnowledgeBaseError::InvalidEntry {
                index,
                reason: "answer is empty".to_string(),
            });
        }
    }

    Ok(entries)
}
