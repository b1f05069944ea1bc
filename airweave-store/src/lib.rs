//! Vector storage capability contract for the search and ingestion
//! cores, plus an in-memory reference adapter.
//!
//! Real deployments wire a Qdrant-like HTTP-backed `VectorStore`
//! outside this workspace; `InMemoryVectorStore` here is the fake used
//! by tests and by `airweave-sync`/`airweave-search`'s own test suites.

pub mod error;
pub mod memory;
pub mod scoring;
pub mod store;
pub mod types;

pub mod prelude {
    pub use crate::error::StoreError;
    pub use crate::memory::InMemoryVectorStore;
    pub use crate::store::VectorStore;
    pub use crate::types::{SearchHit, SearchQuery, UpsertPoint};
}
