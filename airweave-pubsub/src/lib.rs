//! Per-job progress streaming. A `SyncEngine` publishes `SyncJobUpdate`s
//! as a job runs; anything watching that job (an API layer, a CLI, a
//! test) subscribes to its own receiver. Publishing never blocks on a
//! slow subscriber — a subscriber that falls behind sees a gap
//! (`RecvError::Lagged`) rather than stalling the publisher.

use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use airweave_core::ids::SyncJobId;
use airweave_core::sync::{JobCounters, JobStatus};

/// Default per-subscriber buffer size before the oldest unread update is
/// dropped in favor of the newest.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncJobUpdate {
    pub job_id: SyncJobId,
    pub status: JobStatus,
    pub counters: JobCounters,
    pub message: Option<String>,
}

/// In-process pub/sub scoped to sync jobs. Each job gets its own
/// broadcast channel, created lazily on first `subscribe` or `publish`
/// and torn down with `close(job_id)` once the job reaches a terminal
/// status.
#[derive(Clone)]
pub struct PubSub {
    channels: Arc<DashMap<SyncJobId, broadcast::Sender<SyncJobUpdate>>>,
    capacity: usize,
}

impl PubSub {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: Arc::new(DashMap::new()),
            capacity,
        }
    }

    fn sender_for(&self, job_id: SyncJobId) -> broadcast::Sender<SyncJobUpdate> {
        self.channels
            .entry(job_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }

    /// Subscribe to progress updates for a job. Multiple subscribers to
    /// the same job each get their own independent receiver; a slow
    /// receiver lagging behind doesn't affect others.
    pub fn subscribe(&self, job_id: SyncJobId) -> broadcast::Receiver<SyncJobUpdate> {
        self.sender_for(job_id).subscribe()
    }

    /// Publish an update for a job. Returns immediately whether or not
    /// there are any subscribers; this is the only non-blocking path a
    /// `SyncEngine` should use to report progress.
    pub fn publish(&self, job_id: SyncJobId, update: SyncJobUpdate) {
        let sender = self.sender_for(job_id);
        // No receivers is not an error: the job may be running with
        // nobody watching yet.
        let _ = sender.send(update);
    }

    /// Drop the channel for a job. Call once the job reaches a terminal
    /// status so the map doesn't grow unbounded across the process
    /// lifetime; any receivers already holding a clone of the sender
    /// keep working until they drop it.
    pub fn close(&self, job_id: SyncJobId) {
        self.channels.remove(&job_id);
    }

    pub fn subscriber_count(&self, job_id: SyncJobId) -> usize {
        self.channels
            .get(&job_id)
            .map(|s| s.receiver_count())
            .unwrap_or(0)
    }
}

impl Default for PubSub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(job_id: SyncJobId, processed: u64) -> SyncJobUpdate {
        SyncJobUpdate {
            job_id,
            status: JobStatus::InProgress,
            counters: JobCounters {
                entities_processed: processed,
                ..Default::default()
            },
            message: None,
        }
    }

    #[tokio::test]
    async fn subscriber_receives_published_update() {
        let bus = PubSub::new();
        let job_id = SyncJobId::new();
        let mut rx = bus.subscribe(job_id);
        bus.publish(job_id, update(job_id, 10));
        let received = rx.recv().await.unwrap();
        assert_eq!(received.counters.entities_processed, 10);
    }

    #[tokio::test]
    async fn publish_with_no_subscribers_does_not_error() {
        let bus = PubSub::new();
        let job_id = SyncJobId::new();
        bus.publish(job_id, update(job_id, 1));
    }

    #[tokio::test]
    async fn updates_for_different_jobs_are_isolated() {
        let bus = PubSub::new();
        let job_a = SyncJobId::new();
        let job_b = SyncJobId::new();
        let mut rx_a = bus.subscribe(job_a);
        let _rx_b = bus.subscribe(job_b);

        bus.publish(job_a, update(job_a, 5));
        let received = rx_a.recv().await.unwrap();
        assert_eq!(received.job_id, job_a);
    }

    #[tokio::test]
    async fn slow_subscriber_lags_without_blocking_publisher() {
        let bus = PubSub::with_capacity(2);
        let job_id = SyncJobId::new();
        let mut rx = bus.subscribe(job_id);

        for i in 0..5 {
            bus.publish(job_id, update(job_id, i));
        }

        // The receiver fell behind the small buffer; it observes a lag
        // rather than the publisher ever blocking on step above.
        match rx.recv().await {
            Err(broadcast::error::RecvError::Lagged(_)) => {}
            Ok(_) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    #[tokio::test]
    async fn close_drops_the_channel() {
        let bus = PubSub::new();
        let job_id = SyncJobId::new();
        let _rx = bus.subscribe(job_id);
        assert_eq!(bus.subscriber_count(job_id), 1);
        bus.close(job_id);
        assert_eq!(bus.subscriber_count(job_id), 0);
    }
}
