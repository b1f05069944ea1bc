use async_trait::async_trait;

use airweave_core::entity::{ChunkData, Entity, EntityKind};

use crate::error::DagError;
use crate::transformer::Transformer;

/// Splits a generic (non-file, non-code) chunk entity's embeddable text
/// when it exceeds `max_chunk_chars`. Returns a single-element vec
/// unchanged when no split was needed, so the router can tell "split
/// happened" from "nothing to do, proceed to normal routing" by the
/// output length.
pub struct FieldChunker {
    pub max_chunk_chars: usize,
}

impl Default for FieldChunker {
    fn default() -> Self {
        Self { max_chunk_chars: 4000 }
    }
}

#[async_trait]
impl Transformer for FieldChunker {
    async fn apply(&self, entity: Entity) -> Result<Vec<Entity>, DagError> {
        if !matches!(entity.kind, EntityKind::Chunk(_)) {
            return Err(DagError::TransformFailed(
                "field chunker applied to a non-chunk entity".into(),
            ));
        }

        let max_chars = self.max_chunk_chars.max(1);
        if entity.embeddable_text.chars().count() <= max_chars {
            return Ok(vec![entity]);
        }

        let chars: Vec<char> = entity.embeddable_text.chars().collect();
        let windows: Vec<String> = chars.chunks(max_chars).map(|w| w.iter().collect()).collect();
        let count = windows.len() as u32;

        Ok(windows
            .into_iter()
            .enumerate()
            .map(|(i, text)| {
                let mut out = entity.clone();
                out.embeddable_text = text;
                out.kind = EntityKind::Chunk(ChunkData {
                    chunk_index: i as u32,
                    chunk_count: count,
                    vector: None,
                    sparse: None,
                });
                out
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use airweave_core::ids::EntityDefinitionId;

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
    async fn short_text_passes_through_unsplit() {
        let chunker = FieldChunker::default();
        let out = chunker.apply(chunk_entity("short")).await.unwrap();
        assert_eq!(out.len(), 1);
    }

    #[tokio::test]
    async fn long_text_splits_into_multiple_chunks() {
        let chunker = FieldChunker { max_chunk_chars: 10 };
        let out = chunker.apply(chunk_entity(&"a".repeat(25))).await.unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out[2].embeddable_text.len(), 5);
    }
}
