use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{SourceConnectionId, SyncDagId, SyncId, SyncJobId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncStatus {
    Active,
    Inactive,
    Deleted,
}

/// The schedulable unit tying a source connection to a DAG and a cron
/// cadence. `next_scheduled_run` is maintained by the scheduler, not
/// recomputed on every read, so a missed tick doesn't cause drift.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sync {
    pub id: SyncId,
    pub source_connection_id: SourceConnectionId,
    pub dag_id: SyncDagId,
    pub cron_schedule: Option<String>,
    pub next_scheduled_run: Option<DateTime<Utc>>,
    pub status: SyncStatus,
}

impl Sync {
    pub fn is_schedulable(&self) -> bool {
        self.status == SyncStatus::Active && self.cron_schedule.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled)
    }
}

/// Running tallies for a sync job, updated as entities stream through
/// the pipeline and flushed to storage periodically rather than per
/// entity.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct JobCounters {
    pub entities_processed: u64,
    pub entities_inserted: u64,
    pub entities_updated: u64,
    pub entities_skipped: u64,
    pub entities_deleted: u64,
    pub entities_failed: u64,
}

impl JobCounters {
    pub fn total(&self) -> u64 {
        self.entities_inserted + self.entities_updated + self.entities_skipped + self.entities_deleted
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncJob {
    pub id: SyncJobId,
    pub sync_id: SyncId,
    pub status: JobStatus,
    pub counters: JobCounters,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl SyncJob {
    pub fn new(sync_id: SyncId) -> Self {
        Self {
            id: SyncJobId::new(),
            sync_id,
            status: JobStatus::Pending,
            counters: JobCounters::default(),
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            error: None,
        }
    }
}
