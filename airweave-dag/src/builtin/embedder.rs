use std::sync::Arc;

use async_trait::async_trait;

use airweave_core::entity::{Entity, EntityKind};
use airweave_core::providers::{EmbeddingProvider, SparseEncoder};

use crate::error::DagError;
use crate::transformer::Transformer;

/// Terminal transformer before an entity reaches a vector-store
/// destination: embeds `embeddable_text` densely and, when a sparse
/// encoder is configured, also sparsely for hybrid search. Writes the
/// result into whichever chunk-bearing variant the entity carries.
pub struct Embedder {
    pub dense: Arc<dyn EmbeddingProvider>,
    pub sparse: Option<Arc<dyn SparseEncoder>>,
}

impl Embedder {
    pub fn new(dense: Arc<dyn EmbeddingProvider>) -> Self {
        Self { dense, sparse: None }
    }

    pub fn with_sparse(mut self, sparse: Arc<dyn SparseEncoder>) -> Self {
        self.sparse = Some(sparse);
        self
    }
}

#[async_trait]
impl Transformer for Embedder {
    async fn apply(&self, mut entity: Entity) -> Result<Vec<Entity>, DagError> {
        if entity.embeddable_text.trim().is_empty() {
            return Ok(vec![entity]);
        }

        let vector = self
            .dense
            .embed(&entity.embeddable_text)
            .await
            .map_err(|e| DagError::TransformFailed(format!("embedding failed: {e}")))?;

        let sparse = match &self.sparse {
            Some(encoder) => Some(
                encoder
                    .encode(&entity.embeddable_text)
                    .await
                    .map_err(|e| DagError::TransformFailed(format!("sparse encoding failed: {e}")))?,
            ),
            None => None,
        };

        match &mut entity.kind {
            EntityKind::Chunk(chunk) => {
                chunk.vector = Some(vector);
                chunk.sparse = sparse;
            }
            EntityKind::File(file) => {
                let chunk = file.chunk.get_or_insert_with(Default::default);
                chunk.vector = Some(vector);
                chunk.sparse = sparse;
            }
            EntityKind::CodeFile(code) => {
                let chunk = code.file.chunk.get_or_insert_with(Default::default);
                chunk.vector = Some(vector);
                chunk.sparse = sparse;
            }
            EntityKind::Polymorphic(_) => {
                return Err(DagError::TransformFailed(
                    "embedder applied to a polymorphic entity".into(),
                ));
            }
        }

        Ok(vec![entity])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use airweave_core::entity::{ChunkData, SparseVector};
    use airweave_core::error::CoreError;
    use airweave_core::ids::EntityDefinitionId;

    struct FixedEmbedder(usize);

    #[async_trait]
    impl EmbeddingProvider for FixedEmbedder {
        fn dimensions(&self) -> usize {
            self.0
        }
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, CoreError> {
            Ok(vec![1.0; self.0])
        }
    }

    struct FixedSparse;

    #[async_trait]
    impl SparseEncoder for FixedSparse {
        async fn encode(&self, _text: &str) -> Result<SparseVector, CoreError> {
            Ok(SparseVector { indices: vec![1], values: vec![0.5] })
        }
    }

    fn chunk_entity(text: &str) -> Entity {
        Entity {
            entity_id: "e1".into(),
            entity_definition_id: EntityDefinitionId::new(),
            source_name: "test".into(),
            breadcrumbs: vec![],
            payload: serde_json::json!({}),
            embeddable_text: text.into(),
            kind: EntityKind::Chunk(ChunkData::default()),
        }
    }

    #[tokio::test]
    async fn embeds_dense_vector_only_by_default() {
        let embedder = Embedder::new(Arc::new(FixedEmbedder(4)));
        let out = embedder.apply(chunk_entity("hello")).await.unwrap();
        let EntityKind::Chunk(c) = &out[0].kind else { unreachable!() };
        assert_eq!(c.vector.as_ref().unwrap().len(), 4);
        assert!(c.sparse.is_none());
    }

    #[tokio::test]
    async fn embeds_sparse_vector_when_configured() {
        let embedder = Embedder::new(Arc::new(FixedEmbedder(4))).with_sparse(Arc::new(FixedSparse));
        let out = embedder.apply(chunk_entity("hello")).await.unwrap();
        let EntityKind::Chunk(c) = &out[0].kind else { unreachable!() };
        assert!(c.sparse.is_some());
    }

    #[tokio::test]
    async fn skips_embedding_empty_text() {
        let embedder = Embedder::new(Arc::new(FixedEmbedder(4)));
        let out = embedder.apply(chunk_entity("")).await.unwrap();
        let EntityKind::Chunk(c) = &out[0].kind else { unreachable!() };
        assert!(c.vector.is_none());
    }
}
