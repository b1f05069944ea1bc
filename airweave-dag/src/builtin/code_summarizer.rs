use std::sync::Arc;

use async_trait::async_trait;

use airweave_core::providers::{ChatMessage, LLMProvider};

use crate::error::DagError;
use crate::transformer::Transformer;

/// Prepends an LLM-generated one-paragraph summary to a code chunk's
/// embeddable text, so a query in plain language ("where do we retry
/// rate-limited requests") can match code whose identifiers don't
/// literally contain those words. Opt-in: only wired into the DAG when
/// code summarization is enabled for the source connection.
pub struct CodeSummarizer {
    pub llm: Arc<dyn LLMProvider>,
    pub max_tokens: u32,
}

impl CodeSummarizer {
    pub fn new(llm: Arc<dyn LLMProvider>) -> Self {
        Self { llm, max_tokens: 200 }
    }
}

#[async_trait]
impl Transformer for CodeSummarizer {
    async fn apply(
        &self,
        mut entity: airweave_core::entity::Entity,
    ) -> Result<Vec<airweave_core::entity::Entity>, DagError> {
        if entity.embeddable_text.trim().is_empty() {
            return Ok(vec![entity]);
        }

        let messages = vec![
            ChatMessage::system(
                "Summarize the purpose of this code chunk in one short paragraph. \
                 Respond with only the summary.",
            ),
            ChatMessage::user(entity.embeddable_text.clone()),
        ];

        let summary = self
            .llm
            .complete(&messages, self.max_tokens)
            .await
            .map_err(|e| DagError::TransformFailed(format!("code summarization failed: {e}")))?;

        entity.embeddable_text = format!("{summary}\n\n{}", entity.embeddable_text);
        Ok(vec![entity])
    }
}
