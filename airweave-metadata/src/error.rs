use airweave_core::error::CoreError;

/// Errors that can occur in the metadata store.
#[derive(Debug)]
pub enum DataError {
    NotFound(String),
    Conflict(String),
    Database(Box<dyn std::error::Error + Send + Sync>),
    Other(String),
}

impl DataError {
    /// Construct a `Database` variant from any error type. Used by
    /// backend crates (e.g. `airweave-metadata-sql`) to wrap
    /// driver-specific errors without this crate depending on them.
    pub fn database(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        DataError::Database(Box::new(err))
    }
}

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataError::NotFound(msg) => write!(f, "not found: {msg}"),
            DataError::Conflict(msg) => write!(f, "conflict: {msg}"),
            DataError::Database(err) => write!(f, "database error: {err}"),
            DataError::Other(msg) => write!(f, "data error: {msg}"),
        }
    }
}

impl std::error::Error for DataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DataError::Database(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<DataError> for CoreError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::NotFound(msg) => CoreError::NotFound(msg),
            DataError::Conflict(msg) => CoreError::InternalInvariantViolated(msg),
            DataError::Database(e) => CoreError::Transient(e.to_string()),
            DataError::Other(msg) => CoreError::Transient(msg),
        }
    }
}
