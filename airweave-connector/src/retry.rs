use std::time::Duration;

use airweave_ratelimit::backoff_delay;

use crate::error::ConnectorError;

/// Retry/backoff tunables for a single outbound connector request.
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(30),
        }
    }
}

/// Drives `op` up to `config.max_attempts` times. A `RateLimited` error
/// sleeps for the advertised `retry_after` (falling back to jittered
/// backoff if none was given); any other retryable error sleeps for
/// jittered exponential backoff. Non-retryable errors return immediately.
pub async fn execute_with_retry<T, F, Fut>(
    config: RetryConfig,
    mut op: F,
) -> Result<T, ConnectorError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, ConnectorError>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt >= config.max_attempts || !err.is_retryable() => return Err(err),
            Err(ConnectorError::RateLimited { retry_after }) => {
                tokio::time::sleep(retry_after).await;
                attempt += 1;
            }
            Err(err) => {
                let delay = backoff_delay(attempt, config.base_delay, config.max_delay);
                tracing::debug!(attempt, ?delay, %err, "retrying connector request");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn retries_transient_errors_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();
        let result = execute_with_retry(
            RetryConfig {
                max_attempts: 5,
                base_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(5),
            },
            move || {
                let calls = calls_clone.clone();
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    if n < 2 {
                        Err(ConnectorError::Transient("flaky".into()))
                    } else {
                        Ok(42)
                    }
                }
            },
        )
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let result: Result<(), _> = execute_with_retry(
            RetryConfig {
                max_attempts: 2,
                base_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(5),
            },
            || async { Err(ConnectorError::Transient("always fails".into())) },
        )
        .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn non_retryable_error_returns_immediately() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();
        let result: Result<(), _> = execute_with_retry(RetryConfig::default(), move || {
            let calls = calls_clone.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ConnectorError::Validation("bad config".into()))
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
