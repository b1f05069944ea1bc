use serde::{Deserialize, Serialize};

use crate::billing::BillingPlan;
use crate::ids::OrganizationId;

/// The tenant boundary everything else (collections, connections,
/// usage) hangs off of. `is_legacy` orgs predate billing enforcement
/// and are exempt from quota checks, though every admission decision
/// made on their behalf is still logged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: OrganizationId,
    pub name: String,
    pub plan: BillingPlan,
    pub is_legacy: bool,
}
