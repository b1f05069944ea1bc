use uuid::Uuid;

use airweave_core::error::CoreError;

#[derive(Debug)]
pub enum DagError {
    /// A node has more than one non-destination outbound edge, or an
    /// entity-type node has zero or more than one inbound edge.
    Invalid(String),
    /// A transformer node's id has no registered implementation.
    MissingTransformer(Uuid),
    /// A transformer failed while processing an entity.
    TransformFailed(String),
}

impl std::fmt::Display for DagError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DagError::Invalid(msg) => write!(f, "invalid dag: {msg}"),
            DagError::MissingTransformer(id) => write!(f, "no transformer registered for node {id}"),
            DagError::TransformFailed(msg) => write!(f, "transformer failed: {msg}"),
        }
    }
}

impl std::error::Error for DagError {}

impl From<DagError> for CoreError {
    fn from(err: DagError) -> Self {
        match err {
            DagError::Invalid(msg) => CoreError::ValidationFailure(msg),
            DagError::MissingTransformer(id) => {
                CoreError::InternalInvariantViolated(format!("missing transformer for node {id}"))
            }
            DagError::TransformFailed(msg) => CoreError::Transient(msg),
        }
    }
}
