use chrono::Utc;
use dashmap::DashMap;

use async_trait::async_trait;

use airweave_core::ids::CollectionId;

use crate::error::StoreError;
use crate::scoring::{apply_decay, cosine_similarity, decay, hybrid_score, sparse_dot};
use crate::store::VectorStore;
use crate::types::{strip_internal_fields, SearchHit, SearchQuery, UpsertPoint};

struct StoredPoint {
    entity_id: String,
    vector: Vec<f32>,
    sparse: Option<airweave_core::entity::SparseVector>,
    payload: serde_json::Value,
    created_at: chrono::DateTime<Utc>,
}

/// In-memory reference `VectorStore`, used in tests and as a stand-in
/// before a real vector database is wired up. One `DashMap` of points
/// per collection, keyed by `point_id` so a repeat upsert overwrites
/// in place.
#[derive(Default)]
pub struct InMemoryVectorStore {
    collections: DashMap<CollectionId, DashMap<String, StoredPoint>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn timestamp_span(points: &DashMap<String, StoredPoint>) -> (chrono::DateTime<Utc>, f64) {
        let mut oldest = None;
        let mut newest = None;
        for entry in points.iter() {
            let ts = entry.value().created_at;
            oldest = Some(oldest.map_or(ts, |o: chrono::DateTime<Utc>| o.min(ts)));
            newest = Some(newest.map_or(ts, |n: chrono::DateTime<Utc>| n.max(ts)));
        }
        let newest = newest.unwrap_or_else(Utc::now);
        let oldest = oldest.unwrap_or(newest);
        (newest, (newest - oldest).num_milliseconds() as f64 / 1000.0)
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn upsert(
        &self,
        collection_id: CollectionId,
        points: Vec<UpsertPoint>,
    ) -> Result<(), StoreError> {
        let collection = self.collections.entry(collection_id).or_default();
        let now = Utc::now();
        for point in points {
            collection.insert(
                point.point_id,
                StoredPoint {
                    entity_id: point.entity_id,
                    vector: point.vector,
                    sparse: point.sparse,
                    payload: point.payload,
                    created_at: now,
                },
            );
        }
        Ok(())
    }

    async fn delete(
        &self,
        collection_id: CollectionId,
        point_ids: &[String],
    ) -> Result<(), StoreError> {
        if let Some(collection) = self.collections.get(&collection_id) {
            for point_id in point_ids {
                collection.remove(point_id);
            }
        }
        Ok(())
    }

    async fn delete_collection(&self, collection_id: CollectionId) -> Result<(), StoreError> {
        self.collections.remove(&collection_id);
        Ok(())
    }

    async fn search(
        &self,
        collection_id: CollectionId,
        query: SearchQuery,
    ) -> Result<Vec<SearchHit>, StoreError> {
        let Some(collection) = self.collections.get(&collection_id) else {
            return Ok(Vec::new());
        };

        let (newest, span_secs) = Self::timestamp_span(&collection);

        let mut hits: Vec<SearchHit> = collection
            .iter()
            .filter_map(|entry| {
                let point_id = entry.key().clone();
                let stored = entry.value();

                let dense = query
                    .vector
                    .as_ref()
                    .map(|q| cosine_similarity(q, &stored.vector));
                let sparse = match (&query.sparse, &stored.sparse) {
                    (Some(q), Some(s)) => Some(sparse_dot(q, s)),
                    _ => None,
                };
                if dense.is_none() && sparse.is_none() {
                    return None;
                }
                let similarity = hybrid_score(dense, sparse);

                let age_secs = (newest - stored.created_at).num_milliseconds() as f64 / 1000.0;
                let decay_value = decay(age_secs, span_secs);
                let score = apply_decay(similarity, query.decay_weight, decay_value);

                Some(SearchHit {
                    point_id,
                    entity_id: stored.entity_id.clone(),
                    collection_id,
                    score,
                    payload: strip_internal_fields(&stored.payload),
                    created_at: stored.created_at,
                })
            })
            .collect();

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(query.limit);
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use airweave_core::ids::CollectionId;
    use serde_json::json;

    fn point(id: &str, vector: Vec<f32>) -> UpsertPoint {
        UpsertPoint {
            point_id: id.into(),
            entity_id: id.into(),
            vector,
            sparse: None,
            payload: json!({"title": "doc", "vector": [1.0], "checksum": "abc"}),
        }
    }

    #[tokio::test]
    async fn search_ranks_by_cosine_similarity() {
        let store = InMemoryVectorStore::new();
        let collection_id = CollectionId::new();
        store
            .upsert(
                collection_id,
                vec![point("a", vec![1.0, 0.0]), point("b", vec![0.0, 1.0])],
            )
            .await
            .unwrap();

        let hits = store
            .search(
                collection_id,
                SearchQuery {
                    vector: Some(vec![1.0, 0.0]),
                    limit: 10,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(hits[0].point_id, "a");
        assert!(hits[0].score > hits[1].score);
    }

    #[tokio::test]
    async fn search_strips_internal_payload_fields() {
        let store = InMemoryVectorStore::new();
        let collection_id = CollectionId::new();
        store.upsert(collection_id, vec![point("a", vec![1.0])]).await.unwrap();

        let hits = store
            .search(
                collection_id,
                SearchQuery {
                    vector: Some(vec![1.0]),
                    limit: 10,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(hits[0].payload.get("vector").is_none());
        assert!(hits[0].payload.get("checksum").is_none());
        assert_eq!(hits[0].payload.get("title").unwrap(), "doc");
    }

    #[tokio::test]
    async fn delete_removes_point_from_future_searches() {
        let store = InMemoryVectorStore::new();
        let collection_id = CollectionId::new();
        store.upsert(collection_id, vec![point("a", vec![1.0])]).await.unwrap();
        store.delete(collection_id, &["a".to_string()]).await.unwrap();

        let hits = store
            .search(
                collection_id,
                SearchQuery {
                    vector: Some(vec![1.0]),
                    limit: 10,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn bulk_search_returns_one_result_set_per_query() {
        let store = InMemoryVectorStore::new();
        let collection_id = CollectionId::new();
        store.upsert(collection_id, vec![point("a", vec![1.0, 0.0])]).await.unwrap();

        let results = store
            .bulk_search(
                collection_id,
                vec![
                    SearchQuery { vector: Some(vec![1.0, 0.0]), limit: 5, ..Default::default() },
                    SearchQuery { vector: Some(vec![0.0, 1.0]), limit: 5, ..Default::default() },
                ],
            )
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0][0].point_id, "a");
    }

    #[tokio::test]
    async fn search_against_missing_collection_returns_empty() {
        let store = InMemoryVectorStore::new();
        let hits = store
            .search(
                CollectionId::new(),
                SearchQuery { vector: Some(vec![1.0]), limit: 5, ..Default::default() },
            )
            .await
            .unwrap();
        assert!(hits.is_empty());
    }
}
