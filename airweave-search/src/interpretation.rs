//! Query interpretation: an optional LLM call that converts the
//! original query text into a structured filter (field equalities,
//! ranges) expressed the same way a caller-supplied filter is — a raw
//! `serde_json::Value` the vector store backend interprets.

use std::sync::Arc;

use serde_json::Value;

use airweave_core::providers::{ChatMessage, LLMProvider};

const INTERPRETATION_PROMPT: &str = "Extract any explicit filter conditions (field equalities, \
date ranges, categories) implied by the user's query and return them as a single compact JSON \
object. If the query implies no filter, return exactly {}. Reply with JSON only, no commentary.";

/// Returns `None` when interpretation is disabled, no LLM is
/// configured, the call fails, or the LLM's reply isn't valid JSON —
/// interpretation augments the filter, it never blocks the search.
pub async fn interpret(
    query: &str,
    enabled: bool,
    llm: Option<&Arc<dyn LLMProvider>>,
) -> Option<Value> {
    if !enabled {
        return None;
    }
    let llm = llm?;
    let messages = [ChatMessage::system(INTERPRETATION_PROMPT), ChatMessage::user(query.to_string())];
    let text = match llm.complete(&messages, 256).await {
        Ok(text) => text,
        Err(err) => {
            tracing::warn!(error = %err, "query interpretation failed, continuing without a filter");
            return None;
        }
    };
    match serde_json::from_str::<Value>(text.trim()) {
        Ok(Value::Object(map)) if !map.is_empty() => Some(Value::Object(map)),
        Ok(_) => None,
        Err(err) => {
            tracing::warn!(error = %err, reply = %text, "query interpretation returned non-JSON, ignoring");
            None
        }
    }
}
