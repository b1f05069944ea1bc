//! `SearchPipeline`: the orchestrator wiring every stage together in
//! the fixed order the operation graph always resolves to — expansion,
//! interpretation, filter synthesis, embedding, vector search,
//! reranking, completion.

use std::sync::Arc;

use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

use airweave_core::error::CoreError;
use airweave_core::providers::{CompletionEvent, EmbeddingProvider, LLMProvider, SparseEncoder};
use airweave_core::usage::ActionType;
use airweave_quota::guard::QuotaGuard;
use airweave_store::store::VectorStore;
use airweave_store::types::SearchHit;

use crate::types::{
    ResponseType, SearchEvent, SearchRequest, SearchResponse, SearchResult, SearchStatus,
    DEFAULT_MAX_EXPANSION_VARIANTS, RELEVANCE_THRESHOLD,
};
use crate::{completion, embedding, expansion, filter, interpretation, rerank, vector_search};

#[derive(Debug, Clone, Copy)]
pub struct SearchPipelineConfig {
    pub max_expansion_variants: usize,
    /// Total context window of the configured `LLMProvider`, used to
    /// size how much result context the completion stage packs in.
    pub context_window_tokens: usize,
}

impl Default for SearchPipelineConfig {
    fn default() -> Self {
        Self { max_expansion_variants: DEFAULT_MAX_EXPANSION_VARIANTS, context_window_tokens: 128_000 }
    }
}

/// Drives one search end to end against a single `VectorStore`
/// collection. `sparse_encoder` and `llm` are both optional: without a
/// sparse encoder the pipeline runs neural-only; without an LLM,
/// expansion/interpretation/reranking/completion are all skipped and
/// the request degrades to a single-query vector search.
pub struct SearchPipeline {
    store: Arc<dyn VectorStore>,
    quota: Arc<QuotaGuard>,
    embedder: Arc<dyn EmbeddingProvider>,
    sparse_encoder: Option<Arc<dyn SparseEncoder>>,
    llm: Option<Arc<dyn LLMProvider>>,
    config: SearchPipelineConfig,
}

impl SearchPipeline {
    pub fn new(
        store: Arc<dyn VectorStore>,
        quota: Arc<QuotaGuard>,
        embedder: Arc<dyn EmbeddingProvider>,
        sparse_encoder: Option<Arc<dyn SparseEncoder>>,
        llm: Option<Arc<dyn LLMProvider>>,
        config: SearchPipelineConfig,
    ) -> Self {
        Self { store, quota, embedder, sparse_encoder, llm, config }
    }

    /// Runs every stage through reranking, returning the merged,
    /// quality-gated hit set plus status. Shared by `search()` and
    /// `search_stream()` so both retrieve identically; only how the
    /// trailing completion stage is driven differs between them.
    async fn retrieve(
        &self,
        request: &SearchRequest,
        cancel: &CancellationToken,
    ) -> Result<(Vec<SearchHit>, SearchStatus), CoreError> {
        self.quota.admit(request.organization_id, ActionType::Queries, 1).await?;

        check_cancelled(cancel)?;
        let queries = expansion::expand(
            &request.query,
            request.expansion_strategy,
            self.llm.as_ref(),
            self.config.max_expansion_variants,
        )
        .await;

        check_cancelled(cancel)?;
        let interpreted =
            interpretation::interpret(&request.query, request.interpret_query, self.llm.as_ref()).await;
        let merged_filter = filter::synthesize(request.filter.clone(), interpreted);

        check_cancelled(cancel)?;
        let embedded = embedding::embed(&queries, &self.embedder, self.sparse_encoder.as_ref()).await?;

        check_cancelled(cancel)?;
        let fetch_limit = vector_search::candidate_limit(request.limit, request.rerank.is_some());
        let decay_weight = request.decay.as_ref().map(|d| d.weight).unwrap_or(0.0);
        let mut hits = vector_search::search(
            &self.store,
            request.collection_id,
            &embedded,
            merged_filter,
            decay_weight,
            fetch_limit,
            request.offset,
        )
        .await?;

        if let Some(threshold) = request.score_threshold {
            hits.retain(|hit| hit.score >= threshold);
        }
        hits = apply_offset(hits, request.offset);
        hits.truncate(fetch_limit);

        check_cancelled(cancel)?;
        if let (Some(rerank_cfg), Some(llm)) = (&request.rerank, &self.llm) {
            hits = rerank::rerank(&request.query, hits, llm, rerank_cfg.top_n).await;
        }
        hits.truncate(request.limit);

        let status = quality_status(&hits);
        Ok((hits, status))
    }

    /// Runs a search to completion and returns the final response.
    /// Cancellation is honored at each stage boundary by returning a
    /// `CoreError` — there's no partial-result contract for a
    /// non-streaming call.
    pub async fn search(
        &self,
        request: SearchRequest,
        cancel: CancellationToken,
    ) -> Result<SearchResponse, CoreError> {
        let (hits, status) = self.retrieve(&request, &cancel).await?;

        let completion = if request.response_type != ResponseType::Completion {
            None
        } else if status != SearchStatus::Success {
            Some(quality_gate_message(status))
        } else {
            check_cancelled(&cancel)?;
            match &self.llm {
                Some(llm) => Some(
                    completion::complete(&request.query, &hits, llm, self.config.context_window_tokens)
                        .await?,
                ),
                None => Some(no_llm_message()),
            }
        };

        Ok(SearchResponse { results: to_results(hits), status, completion })
    }

    /// Streaming counterpart to `search()`. Retrieval itself isn't
    /// incremental (each stage must finish before the next starts);
    /// only the completion stage streams token-by-token, emitting the
    /// `completion_start` / `completion_delta*` / `completion_done`
    /// sequence the spec calls for. Runs on a spawned task so a slow
    /// completion never blocks the caller from polling the stream; the
    /// task is abandoned (along with any in-flight LLM call) if the
    /// receiver is dropped.
    pub fn search_stream(
        self: Arc<Self>,
        request: SearchRequest,
        cancel: CancellationToken,
    ) -> BoxStream<'static, SearchEvent> {
        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(async move {
            if let Err(err) = self.drive_stream(request, cancel, &tx).await {
                let _ = tx.send(SearchEvent::Error(err.to_string())).await;
            }
        });
        Box::pin(ReceiverStream::new(rx))
    }

    async fn drive_stream(
        &self,
        request: SearchRequest,
        cancel: CancellationToken,
        tx: &mpsc::Sender<SearchEvent>,
    ) -> Result<(), CoreError> {
        let _ = tx.send(SearchEvent::OperationStart("retrieve")).await;
        let (hits, status) = self.retrieve(&request, &cancel).await?;
        let _ = tx.send(SearchEvent::OperationDone("retrieve")).await;

        let completion = if request.response_type != ResponseType::Completion {
            None
        } else if status != SearchStatus::Success {
            Some(quality_gate_message(status))
        } else {
            check_cancelled(&cancel)?;
            match &self.llm {
                Some(llm) => {
                    let _ = tx.send(SearchEvent::CompletionStart).await;
                    let mut stream = completion::complete_stream(
                        &request.query,
                        &hits,
                        llm,
                        self.config.context_window_tokens,
                    )
                    .await?;
                    let mut text = String::new();
                    while let Some(event) = stream.next().await {
                        if let CompletionEvent::Delta(delta) = event {
                            text.push_str(&delta);
                            let _ = tx.send(SearchEvent::CompletionDelta(delta)).await;
                        }
                    }
                    let _ = tx.send(SearchEvent::CompletionDone).await;
                    Some(text)
                }
                None => Some(no_llm_message()),
            }
        };

        let _ = tx
            .send(SearchEvent::Done(SearchResponse { results: to_results(hits), status, completion }))
            .await;
        Ok(())
    }
}

fn check_cancelled(cancel: &CancellationToken) -> Result<(), CoreError> {
    if cancel.is_cancelled() {
        Err(CoreError::Transient("search cancelled".to_string()))
    } else {
        Ok(())
    }
}

fn apply_offset(hits: Vec<SearchHit>, offset: usize) -> Vec<SearchHit> {
    if offset >= hits.len() {
        Vec::new()
    } else {
        hits.into_iter().skip(offset).collect()
    }
}

fn quality_status(hits: &[SearchHit]) -> SearchStatus {
    if hits.is_empty() {
        SearchStatus::NoResults
    } else if !hits.iter().any(|hit| hit.score > RELEVANCE_THRESHOLD) {
        SearchStatus::NoRelevantResults
    } else {
        SearchStatus::Success
    }
}

fn quality_gate_message(status: SearchStatus) -> String {
    match status {
        SearchStatus::NoResults => "I couldn't find any relevant information for that query. Try \
asking about something in your data collection."
            .to_string(),
        SearchStatus::NoRelevantResults => "Your query didn't match anything meaningful in the \
database. Please try a different question related to your data."
            .to_string(),
        SearchStatus::Success => unreachable!("only called on a failed quality gate"),
    }
}

fn no_llm_message() -> String {
    "No language model is configured; returning raw results only.".to_string()
}

fn to_results(hits: Vec<SearchHit>) -> Vec<SearchResult> {
    hits.into_iter()
        .map(|hit| SearchResult { entity_id: hit.entity_id, score: hit.score, payload: hit.payload })
        .collect()
}
