use async_trait::async_trait;
use serde_json::Value;

use crate::credentials::Credentials;
use crate::error::SecurityError;

/// Result of asking an `AuthProvider` to resolve credentials for a
/// source connection configured with the `auth_provider` variant.
pub enum AuthResolution {
    /// The provider handed back usable credentials directly; the
    /// `SyncEngine` wires them into a normal `TokenManager`.
    Direct(Credentials),
    /// The provider can't expose raw credentials (BYOC vaults,
    /// customer-managed proxies); the connector must route every
    /// outbound call through the provider's proxy instead. `reason` is
    /// carried for logging, not interpreted.
    Proxy { base_url: String, bearer_token: String, reason: String },
}

/// Bring-your-own-credentials resolution contract. Each configured
/// provider (e.g. a customer's Vault-backed OAuth broker) implements
/// this once.
#[async_trait]
pub trait AuthProvider: Send + Sync + 'static {
    async fn resolve(&self, source_kind: &str, fields: &Value) -> Result<AuthResolution, SecurityError>;
}
