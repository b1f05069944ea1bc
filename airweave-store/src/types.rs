use chrono::{DateTime, Utc};
use serde_json::Value;

use airweave_core::entity::SparseVector;
use airweave_core::ids::CollectionId;

/// A single point to write into a collection. `point_id` is caller-derived
/// (`airweave_core::hashing::point_id`) so upserts are idempotent.
#[derive(Debug, Clone)]
pub struct UpsertPoint {
    pub point_id: String,
    pub entity_id: String,
    pub vector: Vec<f32>,
    pub sparse: Option<SparseVector>,
    pub payload: Value,
}

/// Fields stripped from a payload before it's handed back in a
/// `SearchHit` — internal bookkeeping the caller never needs and
/// shouldn't pay to transmit.
pub const STRIPPED_PAYLOAD_FIELDS: &[&str] =
    &["vector", "download_url", "checksum", "embeddable_text"];

pub fn strip_internal_fields(payload: &Value) -> Value {
    match payload {
        Value::Object(map) => {
            let mut stripped = map.clone();
            for field in STRIPPED_PAYLOAD_FIELDS {
                stripped.remove(*field);
            }
            Value::Object(stripped)
        }
        other => other.clone(),
    }
}

/// A query against one collection. `limit` is the raw candidate count
/// requested from the store; callers that rerank (the search pipeline)
/// pass an inflated limit and trim afterwards.
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub vector: Option<Vec<f32>>,
    pub sparse: Option<SparseVector>,
    pub limit: usize,
    pub filter: Option<Value>,
    /// Weight in `[0.0, 1.0]` given to recency. `0.0` disables decay
    /// entirely (pure similarity ranking).
    pub decay_weight: f32,
}

#[derive(Debug, Clone)]
pub struct SearchHit {
    pub point_id: String,
    pub entity_id: String,
    pub collection_id: CollectionId,
    pub score: f32,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
}
