use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use airweave_core::entity::{Entity, EntityDefinition, EntityKind};
use airweave_core::ids::EntityDefinitionId;

use crate::error::DagError;
use crate::graph::{NodeId, NodeKind, SyncDag};
use crate::transformer::Transformer;

enum Dispatch {
    CodeFile,
    File,
    Chunk,
    Generic,
}

/// Routes entities through a validated `SyncDag`: code files and
/// regular files always go through their structural chunkers first;
/// everything else is looked up in the precomputed route table and
/// handed to the transformer registered for the matching node, with the
/// transformer's output recursively routed from that node onward.
///
/// A route-table miss (an entity type the DAG has no node for) is
/// treated as "send straight to destination" rather than an error —
/// sources evolve faster than the DAGs built against them, and refusing
/// to ingest an entity type nobody wired up yet would be worse than
/// passing it through unprocessed.
pub struct DagRouter {
    dag: SyncDag,
    routes: HashMap<(NodeId, EntityDefinitionId), Option<NodeId>>,
    transformers: HashMap<uuid::Uuid, Arc<dyn Transformer>>,
    file_chunker: Arc<dyn Transformer>,
    code_chunker: Arc<dyn Transformer>,
    code_summarizer: Option<Arc<dyn Transformer>>,
    field_chunker: Arc<dyn Transformer>,
}

pub struct DagRouterBuilder {
    dag: SyncDag,
    transformers: HashMap<uuid::Uuid, Arc<dyn Transformer>>,
    file_chunker: Arc<dyn Transformer>,
    code_chunker: Arc<dyn Transformer>,
    code_summarizer: Option<Arc<dyn Transformer>>,
    field_chunker: Arc<dyn Transformer>,
}

impl DagRouterBuilder {
    pub fn new(
        dag: SyncDag,
        file_chunker: Arc<dyn Transformer>,
        code_chunker: Arc<dyn Transformer>,
        field_chunker: Arc<dyn Transformer>,
    ) -> Self {
        Self {
            dag,
            transformers: HashMap::new(),
            file_chunker,
            code_chunker,
            code_summarizer: None,
            field_chunker,
        }
    }

    pub fn with_code_summarizer(mut self, summarizer: Arc<dyn Transformer>) -> Self {
        self.code_summarizer = Some(summarizer);
        self
    }

    /// Registers the transformer implementation for a `Transformer` DAG
    /// node id. Every `NodeKind::Transformer` node the route table can
    /// reach must have one registered, or routing through it fails.
    pub fn register(mut self, transformer_id: uuid::Uuid, transformer: Arc<dyn Transformer>) -> Self {
        self.transformers.insert(transformer_id, transformer);
        self
    }

    pub fn build(self) -> Result<DagRouter, DagError> {
        self.dag.validate()?;
        let routes = self.dag.build_routes();
        Ok(DagRouter {
            dag: self.dag,
            routes,
            transformers: self.transformers,
            file_chunker: self.file_chunker,
            code_chunker: self.code_chunker,
            code_summarizer: self.code_summarizer,
            field_chunker: self.field_chunker,
        })
    }
}

impl DagRouter {
    pub fn dag(&self) -> &SyncDag {
        &self.dag
    }

    /// Routes one entity, recursing through however many transformer
    /// hops its DAG path involves, and returns the entities that
    /// reached a terminal destination.
    pub fn process<'a>(
        &'a self,
        producer_id: NodeId,
        entity: Entity,
    ) -> BoxFuture<'a, Result<Vec<Entity>, DagError>> {
        Box::pin(async move {
            let dispatch = match &entity.kind {
                EntityKind::CodeFile(_) => Dispatch::CodeFile,
                EntityKind::File(_) => Dispatch::File,
                EntityKind::Chunk(_) if entity.entity_definition_id == EntityDefinition::chunk() => {
                    Dispatch::Chunk
                }
                _ => Dispatch::Generic,
            };

            match dispatch {
                Dispatch::CodeFile => {
                    let chunks = self.code_chunker.apply(entity).await?;
                    match &self.code_summarizer {
                        Some(summarizer) => {
                            let mut out = Vec::with_capacity(chunks.len());
                            for chunk in chunks {
                                out.extend(summarizer.apply(chunk).await?);
                            }
                            Ok(out)
                        }
                        None => Ok(chunks),
                    }
                }
                Dispatch::File => self.file_chunker.apply(entity).await,
                Dispatch::Chunk => {
                    let result = self.field_chunker.apply(entity).await?;
                    if result.len() > 1 {
                        Ok(result)
                    } else {
                        let entity = result
                            .into_iter()
                            .next()
                            .expect("field chunker always returns at least one entity");
                        self.route_via_dag(producer_id, entity).await
                    }
                }
                Dispatch::Generic => self.route_via_dag(producer_id, entity).await,
            }
        })
    }

    async fn route_via_dag(&self, producer_id: NodeId, entity: Entity) -> Result<Vec<Entity>, DagError> {
        let definition_id = self.resolve_definition_id(&entity);

        match self.routes.get(&(producer_id, definition_id)) {
            None => {
                tracing::warn!(
                    %producer_id,
                    %definition_id,
                    "no route found for entity type, sending straight to destination"
                );
                Ok(vec![entity])
            }
            Some(None) => Ok(vec![entity]),
            Some(Some(consumer_id)) => {
                let consumer_id = *consumer_id;
                let node = self
                    .dag
                    .get_node(consumer_id)
                    .ok_or(DagError::MissingTransformer(consumer_id))?;
                let NodeKind::Transformer { transformer_id } = &node.kind else {
                    return Err(DagError::Invalid(format!(
                        "route target {consumer_id} is not a transformer node"
                    )));
                };
                let transformer_id = *transformer_id;
                let transformer = self
                    .transformers
                    .get(&transformer_id)
                    .ok_or(DagError::MissingTransformer(transformer_id))?;

                let produced = transformer.apply(entity).await?;
                let mut out = Vec::with_capacity(produced.len());
                for e in produced {
                    out.extend(self.process(consumer_id, e).await?);
                }
                Ok(out)
            }
        }
    }

    /// A polymorphic (arbitrary-table) entity is routed by the reserved
    /// definition id every such entity shares, since connectors don't
    /// register one definition per source table. Every other entity
    /// already carries its own concrete definition id from the
    /// connector that produced it.
    fn resolve_definition_id(&self, entity: &Entity) -> EntityDefinitionId {
        match &entity.kind {
            EntityKind::Polymorphic(_) => EntityDefinition::polymorphic_table(),
            _ => entity.entity_definition_id,
        }
    }
}
