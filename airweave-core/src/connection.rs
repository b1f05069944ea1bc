use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ids::{CollectionId, OrganizationId, SourceConnectionId};

/// How a source connection authenticates against its upstream API.
/// Mirrors the four ways a connection can be established without
/// conflating the credential shape with the connection itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AuthMethod {
    /// Credentials (API key, username/password) supplied directly by
    /// the caller at connection-creation time.
    Direct { fields: Map<String, Value> },
    /// An OAuth authorization-code flow completed interactively; the
    /// connection starts pending until the browser round trip lands a
    /// token.
    OauthBrowser { pending: bool },
    /// A caller-supplied OAuth token (and optional refresh token)
    /// pasted in directly, bypassing the browser flow.
    OauthToken {
        access_token: String,
        refresh_token: Option<String>,
    },
    /// Credentials resolved indirectly through a configured auth
    /// provider (BYOC: bring your own credentials) rather than stored
    /// on the connection itself.
    AuthProvider { provider: String, config: Value },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceConnectionStatus {
    Active,
    Inactive,
    Error,
}

/// A configured link from one upstream source into one collection.
/// Owns the auth material, the sync cadence, and incremental-sync
/// bookkeeping (`cursor_field`) for that source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConnection {
    pub id: SourceConnectionId,
    pub organization_id: OrganizationId,
    pub collection_id: CollectionId,
    pub source_kind: String,
    pub name: String,
    pub auth: AuthMethod,
    pub config: Value,
    pub cron_schedule: Option<String>,
    pub cursor_field: Option<String>,
    pub status: SourceConnectionStatus,
}

impl SourceConnection {
    pub fn is_schedulable(&self) -> bool {
        self.status == SourceConnectionStatus::Active && self.cron_schedule.is_some()
    }
}
