use std::collections::HashMap;

use async_trait::async_trait;

use airweave_core::billing::BillingPeriodStatus;
use airweave_core::collection::Collection;
use airweave_core::connection::SourceConnection;
use airweave_core::cursor::Cursor;
use airweave_core::ids::{CollectionId, OrganizationId, SourceConnectionId, SyncId, SyncJobId};
use airweave_core::organization::Organization;
use airweave_core::sync::{Sync, SyncJob};
use airweave_core::usage::{ActionType, Usage};

use crate::error::DataError;

/// Relational store backing the whole core: Organization, Collection,
/// SourceConnection, Sync, SyncJob, Cursor, Usage, and BillingPeriod.
///
/// Implementations MUST support the transactional admission check in
/// `create_job_if_none_non_terminal` with `SELECT ... FOR UPDATE`-equivalent
/// isolation: two concurrent callers racing to start a job for the same
/// sync must not both succeed.
#[async_trait]
pub trait MetadataStore: Send + Sync + 'static {
    async fn get_organization(&self, id: OrganizationId) -> Result<Organization, DataError>;

    async fn get_collection(&self, id: CollectionId) -> Result<Collection, DataError>;

    async fn get_source_connection(
        &self,
        id: SourceConnectionId,
    ) -> Result<SourceConnection, DataError>;
    async fn save_source_connection(
        &self,
        connection: &SourceConnection,
    ) -> Result<SourceConnection, DataError>;
    async fn list_schedulable_source_connections(&self) -> Result<Vec<SourceConnection>, DataError>;

    async fn get_sync(&self, id: SyncId) -> Result<Sync, DataError>;
    async fn save_sync(&self, sync: &Sync) -> Result<Sync, DataError>;
    async fn list_schedulable_syncs(&self) -> Result<Vec<Sync>, DataError>;

    /// Creates a new `SyncJob` for `sync_id`, but only if no existing job
    /// for that sync is in a non-terminal status. Returns
    /// `DataError::Conflict` if one is already running, so a single
    /// scheduler tick racing with a manual "run now" never double-starts
    /// a sync.
    async fn create_job_if_none_non_terminal(&self, sync_id: SyncId) -> Result<SyncJob, DataError>;
    async fn get_job(&self, id: SyncJobId) -> Result<SyncJob, DataError>;
    async fn save_job(&self, job: &SyncJob) -> Result<SyncJob, DataError>;
    async fn list_jobs(&self, sync_id: SyncId, limit: u64) -> Result<Vec<SyncJob>, DataError>;

    async fn get_cursor(&self, source_connection_id: SourceConnectionId) -> Result<Cursor, DataError>;
    async fn save_cursor(&self, cursor: &Cursor) -> Result<(), DataError>;

    async fn get_usage(&self, organization_id: OrganizationId) -> Result<Usage, DataError>;
    async fn increment_usage(
        &self,
        organization_id: OrganizationId,
        action: ActionType,
        amount: u64,
    ) -> Result<Usage, DataError>;

    async fn get_billing_status(
        &self,
        organization_id: OrganizationId,
    ) -> Result<BillingPeriodStatus, DataError>;

    /// Loads the `entity_id -> content_hash` snapshot from the prior
    /// successful job of this sync, used to diff the current run.
    async fn load_previous_snapshot(&self, sync_id: SyncId) -> Result<HashMap<String, String>, DataError>;
    /// Persists the snapshot for a job that completed successfully.
    /// Never called for a job that failed or was cancelled.
    async fn save_snapshot(
        &self,
        sync_id: SyncId,
        snapshot: HashMap<String, String>,
    ) -> Result<(), DataError>;
}
