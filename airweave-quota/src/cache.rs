use std::time::{Duration, Instant};

use airweave_core::billing::{BillingPeriodStatus, BillingPlan};
use airweave_core::usage::{ActionType, Usage, UsageLimit};

pub const CACHE_TTL: Duration = Duration::from_secs(30);

/// One organization's admission state: the committed usage last read
/// from storage, the uncommitted increments admitted since then, and
/// the plan/billing facts admission decisions are made against.
pub struct CachedOrg {
    pub committed: Usage,
    pub pending: Usage,
    pub limit: UsageLimit,
    pub billing_status: BillingPeriodStatus,
    pub plan: BillingPlan,
    pub is_legacy: bool,
    fetched_at: Instant,
}

impl CachedOrg {
    pub fn new(
        committed: Usage,
        limit: UsageLimit,
        billing_status: BillingPeriodStatus,
        plan: BillingPlan,
        is_legacy: bool,
    ) -> Self {
        Self {
            committed,
            pending: Usage::default(),
            limit,
            billing_status,
            plan,
            is_legacy,
            fetched_at: Instant::now(),
        }
    }

    pub fn is_stale(&self) -> bool {
        self.fetched_at.elapsed() >= CACHE_TTL
    }

    /// Usage an admission decision should be measured against: what's
    /// durably recorded plus what's been admitted but not yet flushed.
    pub fn projected(&self, action: ActionType) -> u64 {
        self.committed.get(action) + self.pending.get(action)
    }

    pub fn pending_at_or_above_threshold(&self, action: ActionType) -> bool {
        self.pending.get(action) >= action.flush_threshold()
    }

    pub fn has_any_pending(&self) -> bool {
        self.pending.entities > 0
            || self.pending.queries > 0
            || self.pending.source_connections > 0
            || self.pending.team_members > 0
    }
}
