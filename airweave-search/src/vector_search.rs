//! Vector search: issues the actual similarity search(es) against a
//! `VectorStore`, merging multi-query (expanded) results by
//! `entity_id` and keeping the best score per document.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use airweave_core::entity::SparseVector;
use airweave_core::ids::CollectionId;
use airweave_store::store::VectorStore;
use airweave_store::types::{SearchHit, SearchQuery};

use crate::embedding::Embedded;
use crate::types::RERANK_CANDIDATE_CAP;

/// Candidates requested per query vector. When reranking is configured
/// the fetch is inflated so the reranker has material to work with,
/// capped so a huge `limit` doesn't turn into an unbounded scan.
pub fn candidate_limit(limit: usize, reranking: bool) -> usize {
    if reranking {
        ((limit as f64) * 2.5).round().min(RERANK_CANDIDATE_CAP as f64) as usize
    } else {
        limit
    }
}

/// Runs one search per embedded query against `collection_id`, merges
/// the result sets by `entity_id` (keeping the highest-scoring hit for
/// each), and returns them sorted by score descending.
///
/// The store contract has no native `offset`, so single- and
/// multi-query modes both fetch `fetch_limit + offset` candidates and
/// the offset is applied by the caller after merging — the same order
/// of operations the multi-query path needs regardless, just applied
/// uniformly.
pub async fn search(
    store: &Arc<dyn VectorStore>,
    collection_id: CollectionId,
    embedded: &Embedded,
    filter: Option<Value>,
    decay_weight: f32,
    fetch_limit: usize,
    offset: usize,
) -> Result<Vec<SearchHit>, airweave_store::error::StoreError> {
    let queries: Vec<SearchQuery> = embedded
        .dense
        .iter()
        .enumerate()
        .map(|(i, vector)| SearchQuery {
            vector: Some(vector.clone()),
            sparse: embedded.sparse.as_ref().map(|s| sparse_at(s, i)),
            limit: fetch_limit + offset,
            filter: filter.clone(),
            decay_weight,
        })
        .collect();

    let batches = if queries.len() == 1 {
        vec![store.search(collection_id, queries.into_iter().next().expect("len == 1")).await?]
    } else {
        store.bulk_search(collection_id, queries).await?
    };

    Ok(merge_by_entity_id(batches))
}

fn sparse_at(sparse: &[SparseVector], index: usize) -> SparseVector {
    sparse.get(index).cloned().unwrap_or_default()
}

/// Deduplicates hits across query-expansion variants by `entity_id`,
/// keeping the highest score seen for each, then re-sorts by score.
pub fn merge_by_entity_id(batches: Vec<Vec<SearchHit>>) -> Vec<SearchHit> {
    let mut best: HashMap<String, SearchHit> = HashMap::new();
    for batch in batches {
        for hit in batch {
            best
                .entry(hit.entity_id.clone())
                .and_modify(|existing| {
                    if hit.score > existing.score {
                        *existing = hit.clone();
                    }
                })
                .or_insert(hit);
        }
    }
    let mut merged: Vec<SearchHit> = best.into_values().collect();
    merged.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    merged
}
