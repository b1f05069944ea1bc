use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use airweave_core::error::CoreError;
use airweave_core::ids::OrganizationId;
use airweave_core::organization::Organization;
use airweave_core::usage::ActionType;
use airweave_metadata::store::MetadataStore;

use crate::cache::CachedOrg;

/// Admits or rejects an action against an organization's plan limits
/// and billing status, batching the resulting usage increments in
/// memory and flushing them to the metadata store in bulk instead of on
/// every single admitted action.
///
/// One `tokio::sync::Mutex` per organization serializes admission,
/// in-memory increment, and flush for that organization; unrelated
/// organizations never contend with each other.
pub struct QuotaGuard {
    store: Arc<dyn MetadataStore>,
    orgs: DashMap<OrganizationId, Arc<Mutex<Option<CachedOrg>>>>,
}

impl QuotaGuard {
    pub fn new(store: Arc<dyn MetadataStore>) -> Self {
        Self { store, orgs: DashMap::new() }
    }

    fn slot(&self, org_id: OrganizationId) -> Arc<Mutex<Option<CachedOrg>>> {
        self.orgs.entry(org_id).or_insert_with(|| Arc::new(Mutex::new(None))).clone()
    }

    /// Admits `amount` units of `action` for `org_id`, raising
    /// `PaymentRequired` if the billing status blocks the action
    /// outright or `QuotaExceeded` if it would push usage past the
    /// plan's limit. A legacy organization is never blocked, but the
    /// decision is still logged so billing can audit what would have
    /// happened under enforcement.
    pub async fn admit(
        &self,
        org_id: OrganizationId,
        action: ActionType,
        amount: u64,
    ) -> Result<(), CoreError> {
        let slot = self.slot(org_id);
        let mut guard = slot.lock().await;

        if guard.is_none() || guard.as_ref().is_some_and(CachedOrg::is_stale) {
            *guard = Some(self.load(org_id).await?);
        }
        let cached = guard.as_mut().expect("just populated");

        if cached.is_legacy {
            tracing::debug!(
                %org_id, action = action.as_str(), amount,
                "legacy organization, bypassing quota enforcement"
            );
        } else {
            if cached.billing_status.blocks(action) {
                return Err(CoreError::PaymentRequired(format!(
                    "organization {org_id} billing status blocks {}",
                    action.as_str()
                )));
            }
            if let Some(limit) = cached.limit.get(action) {
                let projected = cached.projected(action) + amount;
                if projected > limit {
                    return Err(CoreError::QuotaExceeded { action: action.as_str().into(), limit });
                }
            }
        }

        cached.pending.add(action, amount);
        if cached.pending_at_or_above_threshold(action) {
            self.flush_locked(org_id, cached).await?;
        }

        Ok(())
    }

    /// Forces a single organization's unflushed usage to flush now.
    /// Called at job completion so a job that admitted fewer entities
    /// than the flush threshold still gets its usage recorded.
    pub async fn flush_org(&self, org_id: OrganizationId) -> Result<(), CoreError> {
        let slot = self.slot(org_id);
        let mut guard = slot.lock().await;
        if let Some(cached) = guard.as_mut() {
            if cached.has_any_pending() {
                self.flush_locked(org_id, cached).await?;
            }
        }
        Ok(())
    }

    /// Forces every organization with unflushed usage to flush now.
    /// Called at job completion and process shutdown so pending
    /// increments below their flush threshold aren't lost.
    pub async fn flush_all(&self) -> Result<(), CoreError> {
        let org_ids: Vec<OrganizationId> = self.orgs.iter().map(|e| *e.key()).collect();
        for org_id in org_ids {
            let slot = self.slot(org_id);
            let mut guard = slot.lock().await;
            if let Some(cached) = guard.as_mut() {
                if cached.has_any_pending() {
                    self.flush_locked(org_id, cached).await?;
                }
            }
        }
        Ok(())
    }

    async fn load(&self, org_id: OrganizationId) -> Result<CachedOrg, CoreError> {
        let org: Organization = self.store.get_organization(org_id).await?;
        let usage = self.store.get_usage(org_id).await?;
        let billing_status = self.store.get_billing_status(org_id).await?;
        Ok(CachedOrg::new(usage, org.plan.default_limits(), billing_status, org.plan, org.is_legacy))
    }

    async fn flush_locked(&self, org_id: OrganizationId, cached: &mut CachedOrg) -> Result<(), CoreError> {
        for action in
            [ActionType::Entities, ActionType::Queries, ActionType::SourceConnections, ActionType::TeamMembers]
        {
            let amount = cached.pending.get(action);
            if amount == 0 {
                continue;
            }
            let updated = self.store.increment_usage(org_id, action, amount).await?;
            cached.committed = updated;
            cached.pending.reset(action);
        }
        Ok(())
    }
}
