//! Per-organization usage admission, sitting between the sync engine
//! (and the search pipeline's query counting) and the metadata store.
//! Batches admitted increments in memory and flushes them once enough
//! have accumulated, rather than writing through on every single one.

pub mod cache;
pub mod guard;

pub mod prelude {
    pub use crate::cache::CachedOrg;
    pub use crate::guard::QuotaGuard;
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;

    use airweave_core::billing::{BillingPeriodStatus, BillingPlan};
    use airweave_core::collection::Collection;
    use airweave_core::connection::SourceConnection;
    use airweave_core::cursor::Cursor;
    use airweave_core::error::CoreError;
    use airweave_core::ids::{CollectionId, OrganizationId, SourceConnectionId, SyncId, SyncJobId};
    use airweave_core::organization::Organization;
    use airweave_core::sync::{Sync, SyncJob};
    use airweave_core::usage::{ActionType, Usage};
    use airweave_metadata::error::DataError;
    use airweave_metadata::store::MetadataStore;

    use crate::guard::QuotaGuard;

    struct FakeStore {
        plan: BillingPlan,
        is_legacy: bool,
        billing_status: BillingPeriodStatus,
        entities: AtomicU64,
        increment_calls: AtomicU64,
    }

    #[async_trait]
    impl MetadataStore for FakeStore {
        async fn get_organization(&self, id: OrganizationId) -> Result<Organization, DataError> {
            Ok(Organization { id, name: "acme".into(), plan: self.plan, is_legacy: self.is_legacy })
        }
        async fn get_collection(&self, _id: CollectionId) -> Result<Collection, DataError> {
            unimplemented!()
        }
        async fn get_source_connection(
            &self,
            _id: SourceConnectionId,
        ) -> Result<SourceConnection, DataError> {
            unimplemented!()
        }
        async fn save_source_connection(
            &self,
            connection: &SourceConnection,
        ) -> Result<SourceConnection, DataError> {
            Ok(connection.clone())
        }
        async fn list_schedulable_source_connections(
            &self,
        ) -> Result<Vec<SourceConnection>, DataError> {
            Ok(vec![])
        }
        async fn get_sync(&self, _id: SyncId) -> Result<Sync, DataError> {
            unimplemented!()
        }
        async fn save_sync(&self, sync: &Sync) -> Result<Sync, DataError> {
            Ok(sync.clone())
        }
        async fn list_schedulable_syncs(&self) -> Result<Vec<Sync>, DataError> {
            Ok(vec![])
        }
        async fn create_job_if_none_non_terminal(&self, _sync_id: SyncId) -> Result<SyncJob, DataError> {
            unimplemented!()
        }
        async fn get_job(&self, _id: SyncJobId) -> Result<SyncJob, DataError> {
            unimplemented!()
        }
        async fn save_job(&self, job: &SyncJob) -> Result<SyncJob, DataError> {
            Ok(job.clone())
        }
        async fn list_jobs(&self, _sync_id: SyncId, _limit: u64) -> Result<Vec<SyncJob>, DataError> {
            Ok(vec![])
        }
        async fn get_cursor(&self, _source_connection_id: SourceConnectionId) -> Result<Cursor, DataError> {
            unimplemented!()
        }
        async fn save_cursor(&self, _cursor: &Cursor) -> Result<(), DataError> {
            Ok(())
        }
        async fn get_usage(&self, _organization_id: OrganizationId) -> Result<Usage, DataError> {
            Ok(Usage { entities: self.entities.load(Ordering::SeqCst), ..Default::default() })
        }
        async fn increment_usage(
            &self,
            _organization_id: OrganizationId,
            action: ActionType,
            amount: u64,
        ) -> Result<Usage, DataError> {
            self.increment_calls.fetch_add(1, Ordering::SeqCst);
            if action == ActionType::Entities {
                self.entities.fetch_add(amount, Ordering::SeqCst);
            }
            Ok(Usage { entities: self.entities.load(Ordering::SeqCst), ..Default::default() })
        }
        async fn get_billing_status(
            &self,
            _organization_id: OrganizationId,
        ) -> Result<BillingPeriodStatus, DataError> {
            Ok(self.billing_status)
        }
        async fn load_previous_snapshot(
            &self,
            _sync_id: SyncId,
        ) -> Result<HashMap<String, String>, DataError> {
            Ok(HashMap::new())
        }
        async fn save_snapshot(
            &self,
            _sync_id: SyncId,
            _snapshot: HashMap<String, String>,
        ) -> Result<(), DataError> {
            Ok(())
        }
    }

    fn fake(plan: BillingPlan, is_legacy: bool, billing_status: BillingPeriodStatus) -> Arc<FakeStore> {
        Arc::new(FakeStore {
            plan,
            is_legacy,
            billing_status,
            entities: AtomicU64::new(0),
            increment_calls: AtomicU64::new(0),
        })
    }

    #[tokio::test]
    async fn admits_within_limit_without_flushing_below_threshold() {
        let store = fake(BillingPlan::Developer, false, BillingPeriodStatus::Active);
        let guard = QuotaGuard::new(store.clone());
        let org_id = OrganizationId::new();

        guard.admit(org_id, ActionType::Entities, 10).await.unwrap();
        assert_eq!(store.increment_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn flushes_once_pending_reaches_the_action_threshold() {
        let store = fake(BillingPlan::Developer, false, BillingPeriodStatus::Active);
        let guard = QuotaGuard::new(store.clone());
        let org_id = OrganizationId::new();

        guard.admit(org_id, ActionType::Entities, 100).await.unwrap();
        assert_eq!(store.increment_calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.entities.load(Ordering::SeqCst), 100);
    }

    #[tokio::test]
    async fn rejects_action_over_plan_limit() {
        let store = fake(BillingPlan::Developer, false, BillingPeriodStatus::Active);
        let guard = QuotaGuard::new(store);
        let org_id = OrganizationId::new();

        let err = guard.admit(org_id, ActionType::Entities, 50_001).await.unwrap_err();
        assert!(matches!(err, CoreError::QuotaExceeded { .. }));
    }

    #[tokio::test]
    async fn blocks_restricted_action_for_billing_status() {
        let store = fake(BillingPlan::Developer, false, BillingPeriodStatus::EndedUnpaid);
        let guard = QuotaGuard::new(store);
        let org_id = OrganizationId::new();

        let err = guard.admit(org_id, ActionType::Entities, 1).await.unwrap_err();
        assert!(matches!(err, CoreError::PaymentRequired(_)));
    }

    #[tokio::test]
    async fn legacy_org_bypasses_enforcement_even_over_limit() {
        let store = fake(BillingPlan::Developer, true, BillingPeriodStatus::EndedUnpaid);
        let guard = QuotaGuard::new(store);
        let org_id = OrganizationId::new();

        guard.admit(org_id, ActionType::Entities, 999_999).await.unwrap();
    }

    #[tokio::test]
    async fn flush_all_drains_pending_below_threshold() {
        let store = fake(BillingPlan::Developer, false, BillingPeriodStatus::Active);
        let guard = QuotaGuard::new(store.clone());
        let org_id = OrganizationId::new();

        guard.admit(org_id, ActionType::Entities, 10).await.unwrap();
        assert_eq!(store.increment_calls.load(Ordering::SeqCst), 0);

        guard.flush_all().await.unwrap();
        assert_eq!(store.increment_calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.entities.load(Ordering::SeqCst), 10);
    }
}
