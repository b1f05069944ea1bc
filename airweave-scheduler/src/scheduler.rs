use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use airweave_core::sync::Sync;
use airweave_metadata::error::DataError;
use airweave_metadata::store::MetadataStore;

use crate::cron;
use crate::trigger::SyncTrigger;

/// Drift tolerance below which a recomputed `next_scheduled_run` isn't
/// worth a write back to the store.
const PERSIST_DRIFT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    pub tick: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { tick: Duration::from_secs(1) }
    }
}

/// Single cooperative loop that checks every active, cron-scheduled sync
/// once per tick and triggers the ones that are due. One process runs
/// one `Scheduler`; it has no leader election or sharding because the
/// "no concurrent non-terminal job" admission check in `MetadataStore`
/// is what actually prevents duplicate runs, not the scheduler itself.
pub struct Scheduler {
    metadata: Arc<dyn MetadataStore>,
    trigger: Arc<dyn SyncTrigger>,
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(metadata: Arc<dyn MetadataStore>, trigger: Arc<dyn SyncTrigger>, config: SchedulerConfig) -> Self {
        Self { metadata, trigger, config }
    }

    /// Runs the tick loop until `cancel` fires. Each tick's failures are
    /// logged and swallowed so one bad sync (a malformed cron
    /// expression, a transient store error) never stops the loop from
    /// checking every other sync.
    pub async fn run(&self, cancel: CancellationToken) {
        tracing::info!(tick_secs = self.config.tick.as_secs(), "scheduler started");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.config.tick) => {}
            }
            if let Err(err) = self.check_syncs().await {
                tracing::error!(error = %err, "scheduler tick failed");
            }
        }
        tracing::info!("scheduler stopped");
    }

    async fn check_syncs(&self) -> Result<(), DataError> {
        let syncs = self.metadata.list_schedulable_syncs().await?;
        let now = chrono::Utc::now();
        for sync in syncs {
            if let Err(err) = self.process_sync(sync.clone(), now).await {
                tracing::error!(sync_id = %sync.id, error = %err, "failed to process scheduled sync");
            }
        }
        Ok(())
    }

    async fn process_sync(&self, mut sync: Sync, now: chrono::DateTime<chrono::Utc>) -> Result<(), DataError> {
        let Some(expr) = sync.cron_schedule.clone() else {
            return Ok(());
        };
        let latest = self.metadata.list_jobs(sync.id, 1).await?;
        let last_run = latest
            .first()
            .map(|j| j.created_at)
            .unwrap_or_else(|| chrono::DateTime::from_timestamp(0, 0).expect("epoch is representable"));

        let next = match cron::next_run(&expr, last_run, now) {
            Ok(next) => next,
            Err(err) => {
                tracing::warn!(sync_id = %sync.id, error = %err, "invalid cron schedule, skipping");
                return Ok(());
            }
        };

        let drifted = match sync.next_scheduled_run {
            None => true,
            Some(scheduled) => (scheduled - next).num_milliseconds().unsigned_abs() as u128
                > PERSIST_DRIFT.as_millis(),
        };
        if drifted {
            sync.next_scheduled_run = Some(next);
            sync = self.metadata.save_sync(&sync).await?;
        }

        if next > now {
            return Ok(());
        }

        match self.metadata.create_job_if_none_non_terminal(sync.id).await {
            Ok(job) => {
                tracing::info!(sync_id = %sync.id, job_id = %job.id, "triggering scheduled sync");
                if let Err(err) = self.trigger.trigger(sync, job).await {
                    tracing::error!(error = %err, "sync trigger failed");
                }
                Ok(())
            }
            Err(DataError::Conflict(_)) => {
                tracing::debug!(sync_id = %sync.id, "sync already has a non-terminal job, skipping");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}
