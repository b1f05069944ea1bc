use dashmap::DashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
    blocked_until: Option<Instant>,
}

/// Refill tokens based on elapsed time and try to consume one.
/// Returns `true` if a token was consumed, `false` if rate-limited.
#[inline]
fn refill_and_try_consume(
    tokens: &mut f64,
    last_refill: &mut Instant,
    max_tokens: f64,
    window: Duration,
) -> bool {
    let now = Instant::now();
    let elapsed = now.duration_since(*last_refill);
    let refill = (elapsed.as_secs_f64() / window.as_secs_f64()) * max_tokens;
    *tokens = (*tokens + refill).min(max_tokens);
    *last_refill = now;

    if *tokens >= 1.0 {
        *tokens -= 1.0;
        true
    } else {
        false
    }
}

/// A token-bucket rate limiter keyed by an arbitrary type.
///
/// Each key gets its own independent bucket. Tokens refill at a constant
/// rate. Connectors key by endpoint (or source connection id) to give
/// each upstream API its own budget.
#[derive(Clone)]
pub struct RateLimiter<K> {
    buckets: Arc<DashMap<K, TokenBucket>>,
    max_tokens: f64,
    window: Duration,
}

impl<K: Eq + Hash + Clone> RateLimiter<K> {
    /// Create a rate limiter that allows `max` requests per `window`.
    pub fn new(max: u64, window: Duration) -> Self {
        Self {
            buckets: Arc::new(DashMap::new()),
            max_tokens: max as f64,
            window,
        }
    }

    /// Try to consume one token for the given key.
    ///
    /// Returns `true` if the request is allowed, `false` if rate-limited
    /// or the key is under a server-imposed `Retry-After` hold.
    pub fn try_acquire(&self, key: &K) -> bool {
        let mut entry = self.buckets.entry(key.clone()).or_insert_with(|| TokenBucket {
            tokens: self.max_tokens,
            last_refill: Instant::now(),
            blocked_until: None,
        });

        let bucket = entry.value_mut();
        if let Some(until) = bucket.blocked_until {
            if Instant::now() < until {
                return false;
            }
            bucket.blocked_until = None;
        }
        refill_and_try_consume(&mut bucket.tokens, &mut bucket.last_refill, self.max_tokens, self.window)
    }

    /// Record an upstream `Retry-After` response: no permit for this key
    /// is granted until `retry_after` elapses, regardless of how many
    /// tokens remain in the bucket.
    pub fn note_retry_after(&self, key: &K, retry_after: Duration) {
        let mut entry = self.buckets.entry(key.clone()).or_insert_with(|| TokenBucket {
            tokens: self.max_tokens,
            last_refill: Instant::now(),
            blocked_until: None,
        });
        entry.value_mut().blocked_until = Some(Instant::now() + retry_after);
    }
}

/// Jittered exponential backoff delay for retrying a failed request.
/// `attempt` is 1-based; full jitter in `[0, base * 2^(attempt-1)]`,
/// capped at `max`. Jitter is derived from the wall clock rather than a
/// PRNG, which is good enough to decorrelate concurrent retries without
/// pulling in a dependency for it.
pub fn backoff_delay(attempt: u32, base: Duration, max: Duration) -> Duration {
    let exp = base.as_secs_f64() * 2f64.powi(attempt.saturating_sub(1) as i32);
    let capped = exp.min(max.as_secs_f64());
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    let jitter_fraction = (nanos % 1_000_000) as f64 / 1_000_000.0;
    Duration::from_secs_f64(capped * jitter_fraction)
}

// ---------------------------------------------------------------------------
// Pluggable rate-limit backend, for code paths that don't know the key
// type at compile time (e.g. a registry driven by connector config).
// ---------------------------------------------------------------------------

/// Trait for pluggable rate-limiting backends.
pub trait RateLimitBackend: Send + Sync + 'static {
    /// Try to acquire a permit. Returns `true` if allowed, `false` if rate-limited.
    fn try_acquire(&self, key: &str, max: u64, window_secs: u64) -> bool;
}

/// Per-key bucket with heterogeneous max/window.
struct ConfiguredBucket {
    tokens: f64,
    max_tokens: f64,
    window: Duration,
    last_refill: Instant,
}

/// In-memory token-bucket backend. Each key gets its own bucket whose
/// max/window are determined by the first call for that key.
#[derive(Clone)]
pub struct InMemoryRateLimiter {
    buckets: Arc<DashMap<String, ConfiguredBucket>>,
}

impl InMemoryRateLimiter {
    pub fn new() -> Self {
        Self {
            buckets: Arc::new(DashMap::new()),
        }
    }
}

impl Default for InMemoryRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimitBackend for InMemoryRateLimiter {
    fn try_acquire(&self, key: &str, max: u64, window_secs: u64) -> bool {
        let max_tokens = max as f64;
        let window = Duration::from_secs(window_secs);

        let mut entry = self
            .buckets
            .entry(key.to_string())
            .or_insert_with(|| ConfiguredBucket {
                tokens: max_tokens,
                max_tokens,
                window,
                last_refill: Instant::now(),
            });

        let bucket = entry.value_mut();
        refill_and_try_consume(&mut bucket.tokens, &mut bucket.last_refill, bucket.max_tokens, bucket.window)
    }
}

/// Clonable handle to a rate-limit backend.
#[derive(Clone)]
pub struct RateLimitRegistry {
    backend: Arc<dyn RateLimitBackend>,
}

impl RateLimitRegistry {
    pub fn new(backend: impl RateLimitBackend) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    pub fn try_acquire(&self, key: &str, max: u64, window_secs: u64) -> bool {
        self.backend.try_acquire(key, max, window_secs)
    }
}

impl Default for RateLimitRegistry {
    fn default() -> Self {
        Self::new(InMemoryRateLimiter::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausts_and_refills() {
        let limiter = RateLimiter::new(2, Duration::from_millis(50));
        assert!(limiter.try_acquire(&"a"));
        assert!(limiter.try_acquire(&"a"));
        assert!(!limiter.try_acquire(&"a"));
        std::thread::sleep(Duration::from_millis(60));
        assert!(limiter.try_acquire(&"a"));
    }

    #[test]
    fn retry_after_blocks_even_with_tokens_available() {
        let limiter = RateLimiter::new(5, Duration::from_secs(1));
        limiter.note_retry_after(&"a", Duration::from_millis(50));
        assert!(!limiter.try_acquire(&"a"));
        std::thread::sleep(Duration::from_millis(60));
        assert!(limiter.try_acquire(&"a"));
    }

    #[test]
    fn keys_are_independent() {
        let limiter = RateLimiter::new(1, Duration::from_secs(1));
        assert!(limiter.try_acquire(&"a"));
        assert!(limiter.try_acquire(&"b"));
    }

    #[test]
    fn backoff_respects_cap() {
        let base = Duration::from_millis(100);
        let max = Duration::from_secs(1);
        assert!(backoff_delay(10, base, max) <= max);
        assert!(backoff_delay(1, base, max) <= max);
    }
}
