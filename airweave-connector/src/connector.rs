use std::collections::BTreeMap;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use serde_json::Value;

use airweave_core::cursor::Cursor;
use airweave_core::entity::Entity;

use crate::error::ConnectorError;

/// Concurrency knobs for an opt-in batch-generation connector: one that
/// partitions its work (per-calendar, per-repository, ...) and drives
/// the framework's worker pool over those partitions instead of a
/// single linear stream.
#[derive(Debug, Clone, Copy)]
pub struct BatchGenerationConfig {
    pub batch_size: usize,
    pub max_queue_size: usize,
    pub preserve_order: bool,
    pub stop_on_error: bool,
}

impl Default for BatchGenerationConfig {
    fn default() -> Self {
        Self {
            batch_size: 4,
            max_queue_size: 256,
            preserve_order: false,
            stop_on_error: false,
        }
    }
}

/// A per-integration adapter producing entities from a remote API.
///
/// Implementations own nothing but their own config and credentials;
/// rate limiting, retry, pagination, and file materialization are
/// framework concerns layered around `stream()`, not reimplemented per
/// connector.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    fn source_kind(&self) -> &str;

    /// Lightweight authorized call (e.g. `GET /me`) used to confirm the
    /// connection's credentials actually work before a sync is scheduled.
    async fn validate(&self) -> Result<bool, ConnectorError>;

    /// Finite, non-restartable stream of entities. `cursor` carries the
    /// incremental-sync bookmark from the previous successful run. An
    /// incremental implementation tracks the maximum observed value per
    /// stream as it iterates (interior mutability, since this takes
    /// `&self`) and surfaces it through `observed_watermarks()`.
    fn stream(&self, cursor: Cursor) -> BoxStream<'static, Result<Entity, ConnectorError>>;

    /// The maximum per-stream watermark observed during the most recent
    /// `stream()` call, to be merged into the cursor once that call has
    /// drained successfully. Empty for connectors with no incremental
    /// state (full-refresh sources).
    fn observed_watermarks(&self) -> BTreeMap<String, Value> {
        BTreeMap::new()
    }

    fn default_cursor_field(&self) -> Option<&str> {
        None
    }

    fn validate_cursor_field(&self, _field: &str) -> bool {
        true
    }

    /// Whether a 401 observed immediately after a successful token
    /// refresh should be retried once more (the default) or surfaced to
    /// the caller as `AuthFailure` right away. A connector whose tokens
    /// are known not to need a grace period after rotation can opt out.
    fn retry_after_refresh(&self) -> bool {
        true
    }

    /// `Some` to opt into the bounded-concurrency partition worker pool
    /// instead of a single `stream()` call.
    fn batch_generation(&self) -> Option<BatchGenerationConfig> {
        None
    }
}
