use async_trait::async_trait;

use crate::credentials::RefreshedTokens;
use crate::error::SecurityError;

/// Performs the provider-specific refresh-token exchange. One
/// implementation per source kind (or one generic OAuth2 implementation
/// parameterized by token/client endpoints).
#[async_trait]
pub trait TokenRefresher: Send + Sync + 'static {
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshedTokens, SecurityError>;
}

/// A `BasicClient` configured with at least an auth URL and a token
/// URL, which is all a refresh exchange needs.
pub type RefreshCapableClient = oauth2::basic::BasicClient<
    oauth2::EndpointSet,
    oauth2::EndpointNotSet,
    oauth2::EndpointNotSet,
    oauth2::EndpointNotSet,
    oauth2::EndpointSet,
>;

/// Generic OAuth2 authorization-code refresher backed by `oauth2`.
pub struct OAuth2Refresher {
    client: RefreshCapableClient,
    http: reqwest::Client,
}

impl OAuth2Refresher {
    pub fn new(client: RefreshCapableClient) -> Self {
        Self {
            client,
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl TokenRefresher for OAuth2Refresher {
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshedTokens, SecurityError> {
        use oauth2::{RefreshToken, TokenResponse};

        let token = self
            .client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(&self.http)
            .await
            .map_err(|e| {
                let msg = e.to_string();
                if msg.contains("invalid_grant") {
                    SecurityError::RefreshRejected(msg)
                } else {
                    SecurityError::RefreshTransport(msg)
                }
            })?;

        let expires_at = token
            .expires_in()
            .map(|d| chrono::Utc::now() + chrono::Duration::from_std(d).unwrap_or_default());

        Ok(RefreshedTokens {
            access_token: token.access_token().secret().clone(),
            refresh_token: token.refresh_token().map(|rt| rt.secret().clone()),
            expires_at,
        })
    }
}
