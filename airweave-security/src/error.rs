use airweave_core::error::CoreError;

/// Errors raised while resolving or refreshing outbound credentials.
#[derive(Debug)]
pub enum SecurityError {
    /// The provider rejected the refresh token outright (revoked,
    /// invalid_grant, or the source doesn't support refresh at all).
    RefreshRejected(String),
    /// The refresh request itself failed (network, 5xx, timeout).
    RefreshTransport(String),
    /// A rotating refresh token was issued but persisting it failed;
    /// the refresh as a whole is reported failed so the old (now
    /// invalid) refresh token is never silently dropped.
    PersistenceFailed(String),
    /// An `AuthProvider` failed to resolve credentials for a source.
    ProviderError(String),
}

impl std::fmt::Display for SecurityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecurityError::RefreshRejected(msg) => write!(f, "token refresh rejected: {msg}"),
            SecurityError::RefreshTransport(msg) => write!(f, "token refresh failed: {msg}"),
            SecurityError::PersistenceFailed(msg) => {
                write!(f, "failed to persist rotated refresh token: {msg}")
            }
            SecurityError::ProviderError(msg) => write!(f, "auth provider error: {msg}"),
        }
    }
}

impl std::error::Error for SecurityError {}

impl From<SecurityError> for CoreError {
    fn from(err: SecurityError) -> Self {
        match err {
            SecurityError::RefreshRejected(msg) => CoreError::AuthFailure(msg),
            SecurityError::RefreshTransport(msg) => CoreError::Transient(msg),
            SecurityError::PersistenceFailed(msg) => CoreError::InternalInvariantViolated(msg),
            SecurityError::ProviderError(msg) => CoreError::AuthFailure(msg),
        }
    }
}
