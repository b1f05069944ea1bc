use serde::{Deserialize, Serialize};

use crate::usage::{ActionType, UsageLimit};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BillingPeriodStatus {
    Active,
    Trial,
    Grace,
    EndedUnpaid,
    Completed,
}

impl BillingPeriodStatus {
    /// Actions blocked outright for this billing status, independent of
    /// any usage limit. Checked before usage is even consulted, so a
    /// grace-period org can't create a connection even if it's well
    /// under its entity limit.
    pub fn restricted_actions(&self) -> &'static [ActionType] {
        match self {
            BillingPeriodStatus::Active | BillingPeriodStatus::Trial => &[],
            BillingPeriodStatus::Grace => &[ActionType::SourceConnections],
            BillingPeriodStatus::EndedUnpaid => {
                &[ActionType::Entities, ActionType::SourceConnections]
            }
            BillingPeriodStatus::Completed => &[
                ActionType::Entities,
                ActionType::SourceConnections,
                ActionType::Queries,
            ],
        }
    }

    pub fn blocks(&self, action: ActionType) -> bool {
        self.restricted_actions().contains(&action)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BillingPlan {
    Developer,
    Pro,
    Team,
    Enterprise,
}

impl BillingPlan {
    pub fn default_limits(&self) -> UsageLimit {
        match self {
            BillingPlan::Developer => UsageLimit {
                max_entities: Some(50_000),
                max_queries: Some(500),
                max_source_connections: Some(10),
                max_team_members: Some(1),
            },
            BillingPlan::Pro => UsageLimit {
                max_entities: Some(100_000),
                max_queries: Some(2_000),
                max_source_connections: Some(50),
                max_team_members: Some(2),
            },
            BillingPlan::Team => UsageLimit {
                max_entities: Some(1_000_000),
                max_queries: Some(10_000),
                max_source_connections: Some(1_000),
                max_team_members: Some(10),
            },
            BillingPlan::Enterprise => UsageLimit::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grace_period_blocks_new_connections_but_not_queries() {
        let status = BillingPeriodStatus::Grace;
        assert!(status.blocks(ActionType::SourceConnections));
        assert!(!status.blocks(ActionType::Queries));
    }

    #[test]
    fn ended_unpaid_allows_only_queries() {
        let status = BillingPeriodStatus::EndedUnpaid;
        assert!(status.blocks(ActionType::Entities));
        assert!(status.blocks(ActionType::SourceConnections));
        assert!(!status.blocks(ActionType::Queries));
    }

    #[test]
    fn enterprise_plan_is_unlimited() {
        let limits = BillingPlan::Enterprise.default_limits();
        assert_eq!(limits.get(ActionType::Entities), None);
    }

    #[test]
    fn developer_plan_limits_match_configured_table() {
        let limits = BillingPlan::Developer.default_limits();
        assert_eq!(limits.get(ActionType::Entities), Some(50_000));
        assert_eq!(limits.get(ActionType::SourceConnections), Some(10));
    }
}
