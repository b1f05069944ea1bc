use chrono::{DateTime, Utc};

/// How a source connection's refresh token behaves once used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPolicy {
    /// No refresh token at all: static API key, browser-scoped token
    /// with no offline access, or a proxy/auth-provider connection.
    /// `refresh_on_unauthorized` is a no-op that returns the current
    /// token unchanged.
    None,
    /// The refresh token is reusable; refreshing only rotates the
    /// access token.
    Static,
    /// Every refresh issues a new refresh token that invalidates the
    /// old one; the new value must be persisted before the refresh is
    /// considered successful.
    Rotating,
}

/// Snapshot of a connection's current credentials, held by the
/// `TokenManager` behind a lock.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Credentials {
    pub fn static_token(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            expires_at: None,
        }
    }
}

/// Result of a successful refresh call against the provider.
#[derive(Debug, Clone)]
pub struct RefreshedTokens {
    pub access_token: String,
    /// `Some` only when the provider rotated the refresh token; absent
    /// for a `Static` policy where the same refresh token stays valid.
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}
