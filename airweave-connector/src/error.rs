use std::time::Duration;

use airweave_core::error::CoreError;

/// Errors a connector or the framework driving it can raise.
#[derive(Debug)]
pub enum ConnectorError {
    Validation(String),
    Auth,
    RateLimited { retry_after: Duration },
    Transient(String),
    NotFound(String),
    Fatal(String),
}

impl ConnectorError {
    /// 4xx other than 401/429 are non-retried; network/5xx/timeout are.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ConnectorError::Transient(_) | ConnectorError::RateLimited { .. })
    }
}

impl std::fmt::Display for ConnectorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectorError::Validation(msg) => write!(f, "validation failure: {msg}"),
            ConnectorError::Auth => write!(f, "authentication failure"),
            ConnectorError::RateLimited { retry_after } => {
                write!(f, "rate limited, retry after {retry_after:?}")
            }
            ConnectorError::Transient(msg) => write!(f, "transient error: {msg}"),
            ConnectorError::NotFound(msg) => write!(f, "not found: {msg}"),
            ConnectorError::Fatal(msg) => write!(f, "fatal connector error: {msg}"),
        }
    }
}

impl std::error::Error for ConnectorError {}

impl From<ConnectorError> for CoreError {
    fn from(err: ConnectorError) -> Self {
        match err {
            ConnectorError::Validation(msg) => CoreError::ValidationFailure(msg),
            ConnectorError::Auth => CoreError::AuthFailure("connector authentication failed".into()),
            ConnectorError::RateLimited { retry_after } => CoreError::RateLimited {
                retry_after: Some(retry_after),
            },
            ConnectorError::Transient(msg) => CoreError::Transient(msg),
            ConnectorError::NotFound(msg) => CoreError::NotFound(msg),
            ConnectorError::Fatal(msg) => CoreError::InternalInvariantViolated(msg),
        }
    }
}
