use airweave_core::error::CoreError;

/// Errors surfaced by a `VectorStore` implementation.
#[derive(Debug)]
pub enum StoreError {
    NotFound(String),
    Backend(Box<dyn std::error::Error + Send + Sync>),
    Other(String),
}

impl StoreError {
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        StoreError::Backend(Box::new(err))
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::NotFound(msg) => write!(f, "not found: {msg}"),
            StoreError::Backend(err) => write!(f, "vector store backend error: {err}"),
            StoreError::Other(msg) => write!(f, "vector store error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Backend(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => CoreError::NotFound(msg),
            StoreError::Backend(e) => CoreError::Transient(e.to_string()),
            StoreError::Other(msg) => CoreError::Transient(msg),
        }
    }
}
