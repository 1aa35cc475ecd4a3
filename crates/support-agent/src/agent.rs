//! Answer composer.
//!
//! retrieve best FAQ match -> build grounded prompt with session history ->
//! LLM call -> append exchange to session.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use support_index::{FaqIndex, FaqMatch};
use support_llm::ChatModel;
use support_types::Turn;

use crate::error::AgentError;
use crate::prompt::{build_messages, FALLBACK_MESSAGE};
use crate::sessions::SessionStore;

/// Retrieval knobs for the agent.
#[derive(Debug, Clone, Default)]
pub struct AgentConfig {
    /// Best match below this cosine similarity is treated as no match
    pub min_score: Option<f32>,
}

/// Outcome of one question.
#[derive(Debug, Clone)]
pub struct AgentReply {
    pub text: String,
    /// FAQ entry used as grounding; `None` on the fallback path
    pub matched: Option<FaqMatch>,
}

impl AgentReply {
    pub fn is_fallback(&self) -> bool {
        self.matched.is_none()
    }
}

/// FAQ-grounded support agent.
pub struct SupportAgent {
    index: Arc<FaqIndex>,
    llm: Arc<dyn ChatModel>,
    sessions: Arc<SessionStore>,
    config: AgentConfig,
}

impl SupportAgent {
    pub fn new(
        index: Arc<FaqIndex>,
        llm: Arc<dyn ChatModel>,
        sessions: Arc<SessionStore>,
        config: AgentConfig,
    ) -> Self {
        Self {
            index,
            llm,
            sessions,
            config,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub fn index(&self) -> &Arc<FaqIndex> {
        &self.index
    }

    /// Answer `user_text` within `session_id`'s conversation.
    pub async fn answer(&self, user_text: &str, session_id: &str) -> Result<String, AgentError> {
        Ok(self.answer_detailed(user_text, session_id).await?.text)
    }

    /// Like [`answer`](Self::answer), also reporting which FAQ entry grounded the reply.
    #[instrument(skip(self, user_text), fields(model = %self.llm.model_name()))]
    pub async fn answer_detailed(
        &self,
        user_text: &str,
        session_id: &str,
    ) -> Result<AgentReply, AgentError> {
        let best = self.retrieve(user_text).await?;

        let Some(best) = best else {
            info!("No FAQ match, returning fallback");
            return Ok(AgentReply {
                text: FALLBACK_MESSAGE.to_string(),
                matched: None,
            });
        };

        debug!(score = best.score, question = %best.entry.question, "Grounding on FAQ entry");

        let handle = self.sessions.get_or_create(session_id);
        let mut session = handle.lock().await;

        let messages = build_messages(&best.entry, session.turns(), user_text);
        let reply = self.llm.complete(&messages).await?;

        session.append_exchange(Turn::human(user_text), Turn::assistant(reply.clone()));
        info!(
            history_turns = session.turns().len(),
            score = best.score,
            "Answered from FAQ"
        );

        Ok(AgentReply {
            text: reply,
            matched: Some(best),
        })
    }

    /// Best match, or `None` when the index has nothing above the score cutoff.
    async fn retrieve(&self, user_text: &str) -> Result<Option<FaqMatch>, AgentError> {
        let best = self.index.search_blocking(user_text, 1).await?.into_iter().next();

        Ok(best.filter(|m| match self.config.min_score {
            Some(min) if m.score < min => {
                debug!(score = m.score, min_score = min, "Best match below cutoff");
                false
            }
            _ => true,
        }))
    }
}
