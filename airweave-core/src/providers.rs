//! Capability traits for the external model services the DAG's embedder
//! and code summarizer transformers, and the search pipeline's query
//! expansion/interpretation/reranking/completion stages, call out to.
//! Kept here rather than in the crates that consume them so `airweave-dag`
//! and `airweave-search` can share one set of fakes in tests instead of
//! each defining its own.

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::entity::SparseVector;
use crate::error::CoreError;

/// Turns text into a dense embedding for vector search.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync + 'static {
    fn dimensions(&self) -> usize;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, CoreError>;

    /// Batched form; implementations backed by a provider with a native
    /// batch endpoint should override this instead of relying on the
    /// default one-at-a-time loop.
    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, CoreError> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }
}

/// Turns text into a term-weighted sparse vector (BM25-style) for hybrid
/// search, alongside a dense `EmbeddingProvider`.
#[async_trait]
pub trait SparseEncoder: Send + Sync + 'static {
    async fn encode(&self, text: &str) -> Result<SparseVector, CoreError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: ChatRole::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }
}

/// One event in a streamed completion, in emission order.
#[derive(Debug, Clone)]
pub enum CompletionEvent {
    Start,
    Delta(String),
    Done,
}

/// A chat-completion backed LLM, used wherever the pipeline needs a
/// natural-language transformation rather than a fixed algorithm: code
/// summarization, query expansion, query interpretation, answer
/// completion.
#[async_trait]
pub trait LLMProvider: Send + Sync + 'static {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        max_tokens: u32,
    ) -> Result<String, CoreError>;

    /// Streaming form used by the search pipeline's completion stage.
    /// Default implementation falls back to `complete` and replays it as
    /// a single `Start`/`Delta`/`Done` triple, so a provider without
    /// native streaming support still satisfies the trait.
    async fn complete_stream(
        &self,
        messages: &[ChatMessage],
        max_tokens: u32,
    ) -> Result<BoxStream<'static, CompletionEvent>, CoreError> {
        let text = self.complete(messages, max_tokens).await?;
        Ok(Box::pin(futures_util::stream::iter(vec![
            CompletionEvent::Start,
            CompletionEvent::Delta(text),
            CompletionEvent::Done,
        ])))
    }
}
