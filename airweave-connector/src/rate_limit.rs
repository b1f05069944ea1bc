use std::time::Duration;

use airweave_ratelimit::RateLimiter;

use crate::error::ConnectorError;

/// Per-endpoint rate budget. Connectors declare one of these per
/// upstream endpoint class (e.g. "list_files" vs "download_file") so a
/// burst against one doesn't starve the other.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitBudget {
    pub max_requests: u64,
    pub window: Duration,
}

impl Default for RateLimitBudget {
    fn default() -> Self {
        Self { max_requests: 10, window: Duration::from_secs(1) }
    }
}

/// Connector-facing wrapper over `airweave_ratelimit::RateLimiter`,
/// keyed by endpoint name. On a 429, the caller records the
/// `Retry-After` via [`ConnectorRateLimiter::note_retry_after`]; the
/// next [`ConnectorRateLimiter::acquire`] for that endpoint waits it
/// out before granting a permit.
#[derive(Clone)]
pub struct ConnectorRateLimiter {
    limiter: RateLimiter<String>,
    poll_interval: Duration,
}

impl ConnectorRateLimiter {
    pub fn new(budget: RateLimitBudget) -> Self {
        Self {
            limiter: RateLimiter::new(budget.max_requests, budget.window),
            poll_interval: Duration::from_millis(50),
        }
    }

    /// Blocks (cooperatively) until a permit for `endpoint` is available.
    pub async fn acquire(&self, endpoint: &str) {
        loop {
            if self.limiter.try_acquire(&endpoint.to_string()) {
                return;
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    pub fn note_retry_after(&self, endpoint: &str, retry_after: Duration) {
        self.limiter.note_retry_after(&endpoint.to_string(), retry_after);
    }
}

/// Default `Retry-After` to assume when a 429 response carries no
/// header value of its own.
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(30);

pub fn rate_limited(retry_after: Option<Duration>) -> ConnectorError {
    ConnectorError::RateLimited { retry_after: retry_after.unwrap_or(DEFAULT_RETRY_AFTER) }
}
