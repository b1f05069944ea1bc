use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionType {
    Entities,
    Queries,
    SourceConnections,
    TeamMembers,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Entities => "entities",
            ActionType::Queries => "queries",
            ActionType::SourceConnections => "source_connections",
            ActionType::TeamMembers => "team_members",
        }
    }

    /// Number of admitted-but-uncommitted actions allowed to accumulate
    /// in memory before a running total must be flushed to storage.
    /// Entities are cheap and numerous so they batch; queries and
    /// source connections are rare enough to flush on every one.
    pub fn flush_threshold(&self) -> u64 {
        match self {
            ActionType::Entities => 100,
            ActionType::Queries => 1,
            ActionType::SourceConnections => 1,
            ActionType::TeamMembers => 1,
        }
    }
}

/// Current usage counters for an organization's billing period.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Usage {
    pub entities: u64,
    pub queries: u64,
    pub source_connections: u64,
    pub team_members: u64,
}

impl Usage {
    pub fn get(&self, action: ActionType) -> u64 {
        match action {
            ActionType::Entities => self.entities,
            ActionType::Queries => self.queries,
            ActionType::SourceConnections => self.source_connections,
            ActionType::TeamMembers => self.team_members,
        }
    }

    pub fn add(&mut self, action: ActionType, amount: u64) {
        match action {
            ActionType::Entities => self.entities += amount,
            ActionType::Queries => self.queries += amount,
            ActionType::SourceConnections => self.source_connections += amount,
            ActionType::TeamMembers => self.team_members += amount,
        }
    }

    /// Clears one counter back to zero, used when a batch of pending
    /// usage has just been flushed to storage.
    pub fn reset(&mut self, action: ActionType) {
        match action {
            ActionType::Entities => self.entities = 0,
            ActionType::Queries => self.queries = 0,
            ActionType::SourceConnections => self.source_connections = 0,
            ActionType::TeamMembers => self.team_members = 0,
        }
    }
}

/// Per-plan ceilings. `None` means unlimited.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct UsageLimit {
    pub max_entities: Option<u64>,
    pub max_queries: Option<u64>,
    pub max_source_connections: Option<u64>,
    pub max_team_members: Option<u64>,
}

impl UsageLimit {
    pub fn get(&self, action: ActionType) -> Option<u64> {
        match action {
            ActionType::Entities => self.max_entities,
            ActionType::Queries => self.max_queries,
            ActionType::SourceConnections => self.max_source_connections,
            ActionType::TeamMembers => self.max_team_members,
        }
    }
}
