//! Reranking: an optional LLM pass over the top vector-search
//! candidates that reorders them by relevance to the original query.
//! Only the head of the candidate list (`top_n`) is shown to the
//! reranker; the rest keep their similarity-ranked order appended
//! after the reranked head, so a huge candidate set never turns into a
//! huge reranking prompt.

use std::sync::Arc;

use airweave_core::providers::{ChatMessage, LLMProvider};
use airweave_store::types::SearchHit;

const RERANK_PROMPT: &str = "Rank the following numbered candidates by relevance to the query. \
Reply with a comma-separated list of candidate numbers, most relevant first, including every \
number exactly once. Reply with the list only, no commentary.";

/// Reranks `hits` in place. Falls back to the incoming (similarity)
/// order whenever the LLM is absent, its reply fails to parse, or it
/// doesn't name every candidate exactly once — a malformed reranking
/// response should never drop or duplicate a result.
pub async fn rerank(
    query: &str,
    mut hits: Vec<SearchHit>,
    llm: &Arc<dyn LLMProvider>,
    top_n: usize,
) -> Vec<SearchHit> {
    if hits.len() <= 1 {
        return hits;
    }
    let split = top_n.min(hits.len());
    let head: Vec<SearchHit> = hits.drain(..split).collect();
    let tail = hits;

    match reorder(query, &head, llm.as_ref()).await {
        Some(mut reordered) => {
            reordered.extend(tail);
            reordered
        }
        None => {
            let mut all = head;
            all.extend(tail);
            all
        }
    }
}

async fn reorder(query: &str, head: &[SearchHit], llm: &dyn LLMProvider) -> Option<Vec<SearchHit>> {
    let candidates: String = head
        .iter()
        .enumerate()
        .map(|(i, hit)| format!("[{i}] {}", hit.payload))
        .collect::<Vec<_>>()
        .join("\n");
    let messages = [
        ChatMessage::system(RERANK_PROMPT),
        ChatMessage::user(format!("Query: {query}\n\n{candidates}")),
    ];
    let reply = match llm.complete(&messages, 256).await {
        Ok(text) => text,
        Err(err) => {
            tracing::warn!(error = %err, "reranking call failed, keeping similarity order");
            return None;
        }
    };

    let order: Vec<usize> = reply
        .trim()
        .split(',')
        .filter_map(|token| token.trim().parse::<usize>().ok())
        .collect();

    let mut seen = vec![false; head.len()];
    if order.len() != head.len() {
        return None;
    }
    for &index in &order {
        if index >= head.len() || seen[index] {
            return None;
        }
        seen[index] = true;
    }

    Some(order.into_iter().map(|i| head[i].clone()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use airweave_core::error::CoreError;
    use airweave_core::ids::CollectionId;
    use async_trait::async_trait;
    use chrono::Utc;
    use futures_util::stream::BoxStream;
    use serde_json::Value;

    struct FakeLlm(&'static str);

    #[async_trait]
    impl LLMProvider for FakeLlm {
        async fn complete(
            &self,
            _messages: &[ChatMessage],
            _max_tokens: u32,
        ) -> Result<String, CoreError> {
            Ok(self.0.to_string())
        }

        async fn complete_stream(
            &self,
            _messages: &[ChatMessage],
            _max_tokens: u32,
        ) -> Result<BoxStream<'static, airweave_core::providers::CompletionEvent>, CoreError>
        {
            unimplemented!()
        }
    }

    fn hit(entity_id: &str, score: f32) -> SearchHit {
        SearchHit {
            point_id: entity_id.to_string(),
            entity_id: entity_id.to_string(),
            collection_id: CollectionId::new(),
            score,
            payload: Value::Null,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn reorders_head_per_llm_response() {
        let llm: Arc<dyn LLMProvider> = Arc::new(FakeLlm("1, 0"));
        let hits = vec![hit("a", 0.5), hit("b", 0.4)];
        let out = rerank("q", hits, &llm, 10).await;
        assert_eq!(out[0].entity_id, "b");
        assert_eq!(out[1].entity_id, "a");
    }

    #[tokio::test]
    async fn tail_beyond_top_n_is_untouched() {
        let llm: Arc<dyn LLMProvider> = Arc::new(FakeLlm("0, 1"));
        let hits = vec![hit("a", 0.9), hit("b", 0.8), hit("c", 0.1)];
        let out = rerank("q", hits, &llm, 2).await;
        assert_eq!(out.iter().map(|h| h.entity_id.as_str()).collect::<Vec<_>>(), ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn malformed_response_falls_back_to_original_order() {
        let llm: Arc<dyn LLMProvider> = Arc::new(FakeLlm("not a list"));
        let hits = vec![hit("a", 0.5), hit("b", 0.4)];
        let out = rerank("q", hits, &llm, 10).await;
        assert_eq!(out[0].entity_id, "a");
        assert_eq!(out[1].entity_id, "b");
    }

    #[tokio::test]
    async fn response_missing_an_index_falls_back() {
        let llm: Arc<dyn LLMProvider> = Arc::new(FakeLlm("0, 0"));
        let hits = vec![hit("a", 0.5), hit("b", 0.4)];
        let out = rerank("q", hits, &llm, 10).await;
        assert_eq!(out[0].entity_id, "a");
        assert_eq!(out[1].entity_id, "b");
    }

    #[tokio::test]
    async fn single_hit_is_returned_unchanged_without_calling_llm() {
        let llm: Arc<dyn LLMProvider> = Arc::new(FakeLlm("garbage"));
        let hits = vec![hit("a", 0.5)];
        let out = rerank("q", hits, &llm, 10).await;
        assert_eq!(out.len(), 1);
    }
}
