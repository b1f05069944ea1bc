use async_trait::async_trait;

use airweave_core::error::CoreError;
use airweave_core::sync::{Sync, SyncJob};

/// Starts the actual work for a sync job the scheduler has just created.
///
/// The scheduler only owns cron bookkeeping and the "no concurrent
/// non-terminal job" admission check; it has no notion of connectors,
/// DAGs, or vector stores. Whatever wires those together (the service
/// composing this crate) implements `SyncTrigger` and is handed the
/// already-created job.
///
/// `trigger` is expected to return quickly — it should hand the job off
/// to wherever it actually runs (a spawned task, a queue) rather than
/// run the sync inline, so one slow sync never delays the next tick's
/// admission check for every other sync.
#[async_trait]
pub trait SyncTrigger: Send + Sync + 'static {
    async fn trigger(&self, sync: Sync, job: SyncJob) -> Result<(), CoreError>;
}
