use async_trait::async_trait;

use airweave_core::ids::CollectionId;

use crate::error::StoreError;
use crate::types::{SearchHit, SearchQuery, UpsertPoint};

/// Pluggable backend for vector storage and similarity search. Mirrors
/// the donor's capability-trait shape (`Send + Sync + 'static`, object
/// safe, wired behind an `Arc<dyn VectorStore>`), so the ingestion and
/// search cores never depend on a concrete vector database.
#[async_trait]
pub trait VectorStore: Send + Sync + 'static {
    async fn upsert(
        &self,
        collection_id: CollectionId,
        points: Vec<UpsertPoint>,
    ) -> Result<(), StoreError>;

    async fn delete(
        &self,
        collection_id: CollectionId,
        point_ids: &[String],
    ) -> Result<(), StoreError>;

    async fn delete_collection(&self, collection_id: CollectionId) -> Result<(), StoreError>;

    async fn search(
        &self,
        collection_id: CollectionId,
        query: SearchQuery,
    ) -> Result<Vec<SearchHit>, StoreError>;

    /// Runs `queries` against `collection_id` concurrently, returning one
    /// result vector per query in the same order. Backends that can fan
    /// out a single multi-query request to the underlying store should
    /// override this default, which just drives the per-query futures
    /// concurrently on the caller's task.
    async fn bulk_search(
        &self,
        collection_id: CollectionId,
        queries: Vec<SearchQuery>,
    ) -> Result<Vec<Vec<SearchHit>>, StoreError> {
        let futures = queries.into_iter().map(|query| self.search(collection_id, query));
        futures_util::future::try_join_all(futures).await
    }
}
