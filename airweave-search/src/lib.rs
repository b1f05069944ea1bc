//! Search pipeline: query expansion, interpretation, filter synthesis,
//! embedding, vector search, reranking, and streamed completion.
//!
//! `SearchPipeline` runs these stages in a fixed order for every
//! request rather than through a generic operation graph — the
//! sequence never varies per request, only whether an optional stage
//! (expansion, interpretation, reranking, completion) is skipped.

pub mod types;

mod completion;
mod embedding;
mod expansion;
mod filter;
mod interpretation;
mod pipeline;
mod rerank;
mod vector_search;

pub use pipeline::{SearchPipeline, SearchPipelineConfig};
pub use types::{
    DecayConfig, QueryExpansionStrategy, RerankConfig, ResponseType, SearchEvent, SearchRequest,
    SearchResponse, SearchResult, SearchStatus,
};

pub mod prelude {
    pub use crate::{
        DecayConfig, QueryExpansionStrategy, RerankConfig, ResponseType, SearchEvent,
        SearchPipeline, SearchPipelineConfig, SearchRequest, SearchResponse, SearchResult,
        SearchStatus,
    };
}
