use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use airweave_core::billing::BillingPeriodStatus;
use airweave_core::collection::Collection;
use airweave_core::connection::SourceConnection;
use airweave_core::cursor::Cursor;
use airweave_core::ids::{CollectionId, OrganizationId, SourceConnectionId, SyncId, SyncJobId};
use airweave_core::organization::Organization;
use airweave_core::sync::{JobStatus, Sync, SyncJob};
use airweave_core::usage::{ActionType, Usage};

use crate::error::DataError;
use crate::store::MetadataStore;

#[derive(Default)]
struct Inner {
    organizations: HashMap<OrganizationId, Organization>,
    collections: HashMap<CollectionId, Collection>,
    source_connections: HashMap<SourceConnectionId, SourceConnection>,
    syncs: HashMap<SyncId, Sync>,
    jobs: HashMap<SyncJobId, SyncJob>,
    cursors: HashMap<SourceConnectionId, Cursor>,
    usage: HashMap<OrganizationId, Usage>,
    billing_status: HashMap<OrganizationId, BillingPeriodStatus>,
    snapshots: HashMap<SyncId, HashMap<String, String>>,
}

/// In-memory reference implementation of `MetadataStore`, used in tests
/// and as a stand-in before a real backend is wired up. Single-process
/// only: the "no concurrent non-terminal job" guarantee is enforced by
/// a single `RwLock`, not real row-level locking.
#[derive(Default)]
pub struct InMemoryMetadataStore {
    inner: RwLock<Inner>,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_organization(&self, org: Organization) {
        self.inner.write().await.organizations.insert(org.id, org);
    }

    pub async fn insert_collection(&self, collection: Collection) {
        self.inner.write().await.collections.insert(collection.id, collection);
    }

    pub async fn insert_source_connection(&self, connection: SourceConnection) {
        self.inner
            .write()
            .await
            .source_connections
            .insert(connection.id, connection);
    }

    pub async fn insert_sync(&self, sync: Sync) {
        self.inner.write().await.syncs.insert(sync.id, sync);
    }

    pub async fn set_billing_status(&self, organization_id: OrganizationId, status: BillingPeriodStatus) {
        self.inner.write().await.billing_status.insert(organization_id, status);
    }
}

#[async_trait]
impl MetadataStore for InMemoryMetadataStore {
    async fn get_organization(&self, id: OrganizationId) -> Result<Organization, DataError> {
        self.inner
            .read()
            .await
            .organizations
            .get(&id)
            .cloned()
            .ok_or_else(|| DataError::NotFound(format!("organization {id}")))
    }

    async fn get_collection(&self, id: CollectionId) -> Result<Collection, DataError> {
        self.inner
            .read()
            .await
            .collections
            .get(&id)
            .cloned()
            .ok_or_else(|| DataError::NotFound(format!("collection {id}")))
    }

    async fn get_source_connection(
        &self,
        id: SourceConnectionId,
    ) -> Result<SourceConnection, DataError> {
        self.inner
            .read()
            .await
            .source_connections
            .get(&id)
            .cloned()
            .ok_or_else(|| DataError::NotFound(format!("source connection {id}")))
    }

    async fn save_source_connection(
        &self,
        connection: &SourceConnection,
    ) -> Result<SourceConnection, DataError> {
        let mut inner = self.inner.write().await;
        inner.source_connections.insert(connection.id, connection.clone());
        Ok(connection.clone())
    }

    async fn list_schedulable_source_connections(&self) -> Result<Vec<SourceConnection>, DataError> {
        Ok(self
            .inner
            .read()
            .await
            .source_connections
            .values()
            .filter(|c| c.is_schedulable())
            .cloned()
            .collect())
    }

    async fn get_sync(&self, id: SyncId) -> Result<Sync, DataError> {
        self.inner
            .read()
            .await
            .syncs
            .get(&id)
            .cloned()
            .ok_or_else(|| DataError::NotFound(format!("sync {id}")))
    }

    async fn save_sync(&self, sync: &Sync) -> Result<Sync, DataError> {
        let mut inner = self.inner.write().await;
        inner.syncs.insert(sync.id, sync.clone());
        Ok(sync.clone())
    }

    async fn list_schedulable_syncs(&self) -> Result<Vec<Sync>, DataError> {
        Ok(self
            .inner
            .read()
            .await
            .syncs
            .values()
            .filter(|s| s.is_schedulable())
            .cloned()
            .collect())
    }

    async fn create_job_if_none_non_terminal(&self, sync_id: SyncId) -> Result<SyncJob, DataError> {
        let mut inner = self.inner.write().await;
        let has_non_terminal = inner
            .jobs
            .values()
            .any(|j| j.sync_id == sync_id && !j.status.is_terminal());
        if has_non_terminal {
            return Err(DataError::Conflict(format!(
                "sync {sync_id} already has a non-terminal job"
            )));
        }
        let job = SyncJob::new(sync_id);
        inner.jobs.insert(job.id, job.clone());
        Ok(job)
    }

    async fn get_job(&self, id: SyncJobId) -> Result<SyncJob, DataError> {
        self.inner
            .read()
            .await
            .jobs
            .get(&id)
            .cloned()
            .ok_or_else(|| DataError::NotFound(format!("sync job {id}")))
    }

    async fn save_job(&self, job: &SyncJob) -> Result<SyncJob, DataError> {
        let mut inner = self.inner.write().await;
        inner.jobs.insert(job.id, job.clone());
        Ok(job.clone())
    }

    async fn list_jobs(&self, sync_id: SyncId, limit: u64) -> Result<Vec<SyncJob>, DataError> {
        let inner = self.inner.read().await;
        let mut jobs: Vec<SyncJob> = inner.jobs.values().filter(|j| j.sync_id == sync_id).cloned().collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs.truncate(limit as usize);
        Ok(jobs)
    }

    async fn get_cursor(&self, source_connection_id: SourceConnectionId) -> Result<Cursor, DataError> {
        Ok(self
            .inner
            .read()
            .await
            .cursors
            .get(&source_connection_id)
            .cloned()
            .unwrap_or_else(|| Cursor::new(source_connection_id)))
    }

    async fn save_cursor(&self, cursor: &Cursor) -> Result<(), DataError> {
        self.inner
            .write()
            .await
            .cursors
            .insert(cursor.source_connection_id, cursor.clone());
        Ok(())
    }

    async fn get_usage(&self, organization_id: OrganizationId) -> Result<Usage, DataError> {
        Ok(self.inner.read().await.usage.get(&organization_id).copied().unwrap_or_default())
    }

    async fn increment_usage(
        &self,
        organization_id: OrganizationId,
        action: ActionType,
        amount: u64,
    ) -> Result<Usage, DataError> {
        let mut inner = self.inner.write().await;
        let usage = inner.usage.entry(organization_id).or_default();
        usage.add(action, amount);
        Ok(*usage)
    }

    async fn get_billing_status(
        &self,
        organization_id: OrganizationId,
    ) -> Result<BillingPeriodStatus, DataError> {
        Ok(self
            .inner
            .read()
            .await
            .billing_status
            .get(&organization_id)
            .copied()
            .unwrap_or(BillingPeriodStatus::Active))
    }

    async fn load_previous_snapshot(&self, sync_id: SyncId) -> Result<HashMap<String, String>, DataError> {
        Ok(self.inner.read().await.snapshots.get(&sync_id).cloned().unwrap_or_default())
    }

    async fn save_snapshot(
        &self,
        sync_id: SyncId,
        snapshot: HashMap<String, String>,
    ) -> Result<(), DataError> {
        self.inner.write().await.snapshots.insert(sync_id, snapshot);
        Ok(())
    }
}
