use async_trait::async_trait;

use airweave_core::entity::Entity;

use crate::error::DagError;

/// A DAG transformer node's implementation: takes one entity, produces
/// zero or more. Registered into a `TransformerRegistry` by the
/// transformer id its `Transformer` node carries.
#[async_trait]
pub trait Transformer: Send + Sync + 'static {
    async fn apply(&self, entity: Entity) -> Result<Vec<Entity>, DagError>;
}
