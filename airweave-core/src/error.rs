use std::time::Duration;

/// Error taxonomy shared by every crate in the ingestion and search core.
///
/// Connector, sync, scheduler, and search code all converge their
/// component-specific errors into this type at the boundary where they
/// hand results back to a caller that doesn't care about the source.
#[derive(Debug)]
pub enum CoreError {
    /// Input failed validation before any side effect was attempted.
    ValidationFailure(String),
    /// Credentials were rejected or could not be refreshed.
    AuthFailure(String),
    /// The caller (or an upstream API) is being rate limited.
    RateLimited { retry_after: Option<Duration> },
    /// A transient failure, safe to retry: timeouts, connection resets,
    /// 5xx responses.
    Transient(String),
    /// The requested resource does not exist or has been deleted.
    NotFound(String),
    /// A usage limit tied to the organization's plan was exceeded.
    QuotaExceeded { action: String, limit: u64 },
    /// The organization's billing status blocks this action.
    PaymentRequired(String),
    /// An invariant the code relies on was violated; indicates a bug
    /// rather than bad input.
    InternalInvariantViolated(String),
}

impl CoreError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::RateLimited { .. } | CoreError::Transient(_))
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            CoreError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

impl std::fmt::Display for CoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoreError::ValidationFailure(msg) => write!(f, "validation failed: {msg}"),
            CoreError::AuthFailure(msg) => write!(f, "authentication failed: {msg}"),
            CoreError::RateLimited { retry_after } => match retry_after {
                Some(d) => write!(f, "rate limited, retry after {}s", d.as_secs()),
                None => write!(f, "rate limited"),
            },
            CoreError::Transient(msg) => write!(f, "transient error: {msg}"),
            CoreError::NotFound(msg) => write!(f, "not found: {msg}"),
            CoreError::QuotaExceeded { action, limit } => {
                write!(f, "quota exceeded for {action}: limit is {limit}")
            }
            CoreError::PaymentRequired(msg) => write!(f, "payment required: {msg}"),
            CoreError::InternalInvariantViolated(msg) => {
                write!(f, "internal invariant violated: {msg}")
            }
        }
    }
}

impl std::error::Error for CoreError {}

pub type CoreResult<T> = Result<T, CoreError>;
