use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use airweave_core::ids::SourceConnectionId;

use crate::credentials::{Credentials, RefreshPolicy};
use crate::error::SecurityError;
use crate::persistence::CredentialPersistence;
use crate::refresher::TokenRefresher;

struct CacheInner {
    access_token: String,
    refresh_token: Option<String>,
}

/// Supplies a valid access token to a connector, refreshing reactively
/// on 401 and serializing concurrent refresh attempts so only one
/// network call happens per expiry even if every in-flight request
/// fails at once.
pub struct TokenManager {
    source_connection_id: SourceConnectionId,
    policy: RefreshPolicy,
    inner: Arc<RwLock<CacheInner>>,
    refresh_lock: Mutex<()>,
    refresher: Option<Arc<dyn TokenRefresher>>,
    persistence: Option<Arc<dyn CredentialPersistence>>,
}

impl TokenManager {
    pub fn new(
        source_connection_id: SourceConnectionId,
        initial: Credentials,
        policy: RefreshPolicy,
        refresher: Option<Arc<dyn TokenRefresher>>,
        persistence: Option<Arc<dyn CredentialPersistence>>,
    ) -> Self {
        Self {
            source_connection_id,
            policy,
            inner: Arc::new(RwLock::new(CacheInner {
                access_token: initial.access_token,
                refresh_token: initial.refresh_token,
            })),
            refresh_lock: Mutex::new(()),
            refresher,
            persistence,
        }
    }

    /// The last-known access token. Does not trigger a refresh.
    pub async fn current(&self) -> String {
        self.inner.read().await.access_token.clone()
    }

    /// Refreshes the access token after a 401, or returns the current
    /// token unmodified if this connection has no refresh token to use
    /// (static key, browser-only scope, proxy auth). `observed_token` is
    /// the token the caller saw fail; if another caller already
    /// refreshed past it, this returns the newer token without making a
    /// second network call.
    pub async fn refresh_on_unauthorized(&self, observed_token: &str) -> Result<String, SecurityError> {
        if self.policy == RefreshPolicy::None {
            return Ok(self.inner.read().await.access_token.clone());
        }

        let refresh_token = {
            let cache = self.inner.read().await;
            if cache.access_token != observed_token {
                debug!(source_connection_id = %self.source_connection_id, "token already refreshed by another caller");
                return Ok(cache.access_token.clone());
            }
            match cache.refresh_token.clone() {
                Some(rt) => rt,
                None => return Ok(cache.access_token.clone()),
            }
        };

        let _guard = self.refresh_lock.lock().await;

        {
            let cache = self.inner.read().await;
            if cache.access_token != observed_token {
                return Ok(cache.access_token.clone());
            }
        }

        let refresher = self
            .refresher
            .as_ref()
            .ok_or_else(|| SecurityError::RefreshRejected("no refresher configured".into()))?;

        let refreshed = refresher.refresh(&refresh_token).await?;

        if self.policy == RefreshPolicy::Rotating {
            if let Some(new_refresh) = &refreshed.refresh_token {
                if let Some(persistence) = &self.persistence {
                    persistence
                        .persist_rotated_refresh_token(self.source_connection_id, new_refresh)
                        .await
                        .map_err(|e| SecurityError::PersistenceFailed(e.to_string()))?;
                } else {
                    warn!(
                        source_connection_id = %self.source_connection_id,
                        "rotating refresh token issued with no persistence backend configured"
                    );
                }
            }
        }

        let mut cache = self.inner.write().await;
        cache.access_token = refreshed.access_token.clone();
        if let Some(new_refresh) = refreshed.refresh_token {
            cache.refresh_token = Some(new_refresh);
        }
        Ok(cache.access_token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::RefreshedTokens;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingRefresher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TokenRefresher for CountingRefresher {
        async fn refresh(&self, _refresh_token: &str) -> Result<RefreshedTokens, SecurityError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(RefreshedTokens {
                access_token: format!("new-token-{}", self.calls.load(Ordering::SeqCst)),
                refresh_token: None,
                expires_at: None,
            })
        }
    }

    #[tokio::test]
    async fn no_refresh_token_returns_current_unmodified() {
        let manager = TokenManager::new(
            SourceConnectionId::new(),
            Credentials::static_token("static-key"),
            RefreshPolicy::None,
            None,
            None,
        );
        let result = manager.refresh_on_unauthorized("static-key").await.unwrap();
        assert_eq!(result, "static-key");
    }

    #[tokio::test]
    async fn concurrent_refreshes_share_one_network_call() {
        let refresher = Arc::new(CountingRefresher { calls: AtomicUsize::new(0) });
        let manager = Arc::new(TokenManager::new(
            SourceConnectionId::new(),
            Credentials {
                access_token: "old".into(),
                refresh_token: Some("rt".into()),
                expires_at: None,
            },
            RefreshPolicy::Static,
            Some(refresher.clone() as Arc<dyn TokenRefresher>),
            None,
        ));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let manager = manager.clone();
            handles.push(tokio::spawn(async move {
                manager.refresh_on_unauthorized("old").await.unwrap()
            }));
        }
        let mut results = Vec::new();
        for h in handles {
            results.push(h.await.unwrap());
        }

        assert_eq!(refresher.calls.load(Ordering::SeqCst), 1);
        assert!(results.iter().all(|r| r == "new-token-1"));
    }

    #[tokio::test]
    async fn rotating_policy_requires_persistence_of_new_refresh_token() {
        struct RotatingRefresher;
        #[async_trait]
        impl TokenRefresher for RotatingRefresher {
            async fn refresh(&self, _refresh_token: &str) -> Result<RefreshedTokens, SecurityError> {
                Ok(RefreshedTokens {
                    access_token: "new-access".into(),
                    refresh_token: Some("new-refresh".into()),
                    expires_at: None,
                })
            }
        }

        struct FailingPersistence;
        #[async_trait]
        impl CredentialPersistence for FailingPersistence {
            async fn persist_rotated_refresh_token(
                &self,
                _id: SourceConnectionId,
                _new_refresh_token: &str,
            ) -> Result<(), SecurityError> {
                Err(SecurityError::PersistenceFailed("disk full".into()))
            }
        }

        let manager = TokenManager::new(
            SourceConnectionId::new(),
            Credentials {
                access_token: "old".into(),
                refresh_token: Some("rt".into()),
                expires_at: None,
            },
            RefreshPolicy::Rotating,
            Some(Arc::new(RotatingRefresher)),
            Some(Arc::new(FailingPersistence)),
        );

        let result = manager.refresh_on_unauthorized("old").await;
        assert!(result.is_err());
        // the in-memory token must not have advanced past the failed persist
        assert_eq!(manager.current().await, "old");
    }
}
