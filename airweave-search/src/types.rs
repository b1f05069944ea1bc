//! Request/response shapes for a search, plus the streaming event type
//! `search_stream` emits.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use airweave_core::ids::{CollectionId, OrganizationId};

/// Score below which a hit doesn't count toward the "relevant results"
/// quality gate. Not a hard filter — only decides `NoRelevantResults`.
pub const RELEVANCE_THRESHOLD: f32 = 0.25;

/// Cap on how many query variants expansion is allowed to produce,
/// beyond the original query itself.
pub const DEFAULT_MAX_EXPANSION_VARIANTS: usize = 4;

/// Candidate fetch cap per query when reranking is configured, so the
/// reranker has enough material without an unbounded fetch.
pub const RERANK_CANDIDATE_CAP: usize = 250;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QueryExpansionStrategy {
    #[default]
    NoExpansion,
    Llm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ResponseType {
    #[default]
    Raw,
    Completion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchStatus {
    Success,
    NoResults,
    NoRelevantResults,
}

/// Time-decay weighting for a search. `datetime_field` names the
/// payload field the caller considers authoritative for recency
/// (carried through for API/audit purposes); the decay curve itself is
/// computed by the vector store over its own point-ingestion
/// timestamps, since points here don't carry an independently settable
/// timestamp field.
#[derive(Debug, Clone)]
pub struct DecayConfig {
    pub datetime_field: String,
    pub weight: f32,
}

/// Reranking knobs. `top_n` bounds how many vector-search candidates
/// are actually shown to the reranker; the remainder keep their
/// similarity-ranked order appended after the reranked head.
#[derive(Debug, Clone, Copy)]
pub struct RerankConfig {
    pub top_n: usize,
}

impl Default for RerankConfig {
    fn default() -> Self {
        Self { top_n: 50 }
    }
}

#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub organization_id: OrganizationId,
    pub collection_id: CollectionId,
    pub query: String,
    pub expansion_strategy: QueryExpansionStrategy,
    pub interpret_query: bool,
    pub filter: Option<Value>,
    pub limit: usize,
    pub offset: usize,
    pub score_threshold: Option<f32>,
    pub decay: Option<DecayConfig>,
    pub rerank: Option<RerankConfig>,
    pub response_type: ResponseType,
}

impl SearchRequest {
    pub fn new(
        organization_id: OrganizationId,
        collection_id: CollectionId,
        query: impl Into<String>,
    ) -> Self {
        Self {
            organization_id,
            collection_id,
            query: query.into(),
            expansion_strategy: QueryExpansionStrategy::NoExpansion,
            interpret_query: false,
            filter: None,
            limit: 20,
            offset: 0,
            score_threshold: None,
            decay: None,
            rerank: None,
            response_type: ResponseType::Raw,
        }
    }
}

/// One result handed back to the caller: the internal `point_id` and
/// `vector` are never exposed here, only what a client can act on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub entity_id: String,
    pub score: f32,
    pub payload: Value,
}

#[derive(Debug, Clone)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    pub status: SearchStatus,
    pub completion: Option<String>,
}

/// One event in a streamed search, in emission order. A non-streaming
/// `search()` call runs the same stages but only returns the final
/// `SearchResponse`.
#[derive(Debug, Clone)]
pub enum SearchEvent {
    OperationStart(&'static str),
    OperationDone(&'static str),
    CompletionStart,
    CompletionDelta(String),
    CompletionDone,
    /// Terminal: carries the same status/results a non-streaming call
    /// would have returned, once retrieval is done.
    Done(SearchResponse),
    /// Terminal: a stage failed or the request was cancelled.
    Error(String),
}
