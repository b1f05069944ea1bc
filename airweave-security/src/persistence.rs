use async_trait::async_trait;

use airweave_core::ids::SourceConnectionId;

use crate::error::SecurityError;

/// Durably stores a rotated refresh token. Implemented by
/// `airweave-metadata` in the hosting application; kept here as a
/// narrow trait so `TokenManager` doesn't depend on the full
/// `MetadataStore` surface.
#[async_trait]
pub trait CredentialPersistence: Send + Sync + 'static {
    async fn persist_rotated_refresh_token(
        &self,
        source_connection_id: SourceConnectionId,
        new_refresh_token: &str,
    ) -> Result<(), SecurityError>;
}
