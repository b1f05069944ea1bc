//! Completion: streams a natural-language answer over the final result
//! set using the context prompt. Packs as many result snippets as fit
//! in the model's context window minus a safety margin, so a large
//! candidate set never overflows the provider's token limit.

use std::sync::Arc;

use futures_util::stream::{BoxStream, StreamExt};

use airweave_core::error::CoreError;
use airweave_core::providers::{ChatMessage, CompletionEvent, LLMProvider};
use airweave_store::types::SearchHit;

/// Tokens reserved for the model's own reply and prompt overhead,
/// subtracted from `context_window_tokens` before packing snippets.
pub const COMPLETION_SAFETY_MARGIN_TOKENS: usize = 2_000;

const CONTEXT_PROMPT: &str = "You are an assistant with access to a knowledge base. Use the \
following context to answer the user's question. If the context doesn't contain the answer, say \
so plainly rather than guessing.\n\nContext:\n{context}";

/// Crude chars-per-token estimate used to bound how much context is
/// packed into the completion prompt; good enough for a packing
/// decision, not for billing.
fn estimate_tokens(text: &str) -> usize {
    (text.len() as f64 / 4.0).ceil() as usize
}

/// Greedily packs hit payloads into a context blob until adding the
/// next one would exceed `budget_tokens`. Always includes at least the
/// first hit even if it alone exceeds budget, so completion never runs
/// with zero context just because one result is huge.
pub fn pack_context(hits: &[SearchHit], budget_tokens: usize) -> String {
    let mut blob = String::new();
    let mut used = 0usize;
    for (i, hit) in hits.iter().enumerate() {
        let snippet = format!("[{}] {}\n", hit.entity_id, hit.payload);
        let cost = estimate_tokens(&snippet);
        if i > 0 && used + cost > budget_tokens {
            break;
        }
        blob.push_str(&snippet);
        used += cost;
    }
    blob
}

fn prompt_messages(query: &str, context: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(CONTEXT_PROMPT.replace("{context}", context)),
        ChatMessage::user(query.to_string()),
    ]
}

/// Non-streaming completion: buffers the whole answer before
/// returning it. Used by `search()`, where the caller wants one final
/// `SearchResponse` rather than incremental events.
pub async fn complete(
    query: &str,
    hits: &[SearchHit],
    llm: &Arc<dyn LLMProvider>,
    context_window_tokens: usize,
) -> Result<String, CoreError> {
    let budget = context_window_tokens.saturating_sub(COMPLETION_SAFETY_MARGIN_TOKENS);
    let context = pack_context(hits, budget);
    let messages = prompt_messages(query, &context);
    llm.complete(&messages, COMPLETION_SAFETY_MARGIN_TOKENS as u32).await
}

/// Streaming completion: forwards the provider's own `CompletionEvent`
/// stream. Used by `search_stream()` to emit `completion_start` /
/// `completion_delta` / `completion_done` as they arrive rather than
/// buffering the whole answer first.
pub async fn complete_stream(
    query: &str,
    hits: &[SearchHit],
    llm: &Arc<dyn LLMProvider>,
    context_window_tokens: usize,
) -> Result<BoxStream<'static, CompletionEvent>, CoreError> {
    let budget = context_window_tokens.saturating_sub(COMPLETION_SAFETY_MARGIN_TOKENS);
    let context = pack_context(hits, budget);
    let messages = prompt_messages(query, &context);
    llm.complete_stream(&messages, COMPLETION_SAFETY_MARGIN_TOKENS as u32).await
}

/// Drains a `CompletionEvent` stream into the final joined answer text.
pub async fn drain(mut stream: BoxStream<'static, CompletionEvent>) -> String {
    let mut out = String::new();
    while let Some(event) = stream.next().await {
        if let CompletionEvent::Delta(delta) = event {
            out.push_str(&delta);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use airweave_core::ids::CollectionId;
    use chrono::Utc;
    use serde_json::json;

    fn hit(entity_id: &str, payload: serde_json::Value) -> SearchHit {
        SearchHit {
            point_id: entity_id.to_string(),
            entity_id: entity_id.to_string(),
            collection_id: CollectionId::new(),
            score: 0.9,
            payload,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn packs_everything_within_a_generous_budget() {
        let hits = vec![hit("a", json!({"title": "one"})), hit("b", json!({"title": "two"}))];
        let context = pack_context(&hits, 10_000);
        assert!(context.contains("one"));
        assert!(context.contains("two"));
    }

    #[test]
    fn always_includes_at_least_the_first_hit() {
        let hits = vec![hit("a", json!({"title": "x".repeat(10_000)}))];
        let context = pack_context(&hits, 1);
        assert!(context.contains('a'));
    }

    #[test]
    fn stops_packing_once_budget_is_exceeded() {
        let hits = vec![
            hit("a", json!({"title": "x".repeat(100)})),
            hit("b", json!({"title": "y".repeat(100)})),
        ];
        let context = pack_context(&hits, 10);
        assert!(context.contains('a'));
        assert!(!context.contains('b'));
    }
}
