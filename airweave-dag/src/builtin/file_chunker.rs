use async_trait::async_trait;

use airweave_core::entity::{ChunkData, Entity, EntityKind, FileData};

use crate::error::DagError;
use crate::transformer::Transformer;

/// Splits a materialized file's text content into fixed-size windows,
/// one `File` entity per window sharing the source entity's id (so
/// `point_id` scopes them by `chunk_index` rather than needing a
/// mangled id). Binary content (content that doesn't decode as UTF-8)
/// is kept as a single metadata-only chunk with empty embeddable text.
pub struct FileChunker {
    pub max_chunk_chars: usize,
}

impl Default for FileChunker {
    fn default() -> Self {
        Self { max_chunk_chars: 4000 }
    }
}

#[async_trait]
impl Transformer for FileChunker {
    async fn apply(&self, entity: Entity) -> Result<Vec<Entity>, DagError> {
        let EntityKind::File(file) = &entity.kind else {
            return Err(DagError::TransformFailed(
                "file chunker applied to a non-file entity".into(),
            ));
        };

        let text = match &file.content {
            Some(bytes) => std::str::from_utf8(bytes).ok().map(str::to_owned),
            None => None,
        };

        let Some(text) = text else {
            return Ok(vec![single_chunk(entity, String::new())]);
        };

        let windows = windowed(&text, self.max_chunk_chars.max(1));
        let count = windows.len().max(1) as u32;

        if windows.is_empty() {
            return Ok(vec![single_chunk(entity, String::new())]);
        }

        Ok(windows
            .into_iter()
            .enumerate()
            .map(|(i, window)| {
                let mut out = entity.clone();
                out.embeddable_text = window;
                if let EntityKind::File(file) = &mut out.kind {
                    file.chunk = Some(ChunkData { chunk_index: i as u32, chunk_count: count, vector: None, sparse: None });
                }
                out
            })
            .collect())
    }
}

fn single_chunk(mut entity: Entity, text: String) -> Entity {
    entity.embeddable_text = text;
    if let EntityKind::File(file) = &mut entity.kind {
        file.chunk = Some(ChunkData { chunk_index: 0, chunk_count: 1, vector: None, sparse: None });
    }
    entity
}

fn windowed(text: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return vec![];
    }
    chars
        .chunks(max_chars)
        .map(|window| window.iter().collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use airweave_core::entity::Breadcrumb;
    use airweave_core::ids::EntityDefinitionId;

    fn file_entity(content: Option<Vec<u8>>) -> Entity {
        Entity {
            entity_id: "f1".into(),
            entity_definition_id: EntityDefinitionId::new(),
            source_name: "test".into(),
            breadcrumbs: Vec::<Breadcrumb>::new(),
            payload: serde_json::json!({}),
            embeddable_text: String::new(),
            kind: EntityKind::File(FileData { content, ..Default::default() }),
        }
    }

    #[tokio::test]
    async fn splits_long_text_into_multiple_chunks() {
        let content = "a".repeat(10_000).into_bytes();
        let chunker = FileChunker { max_chunk_chars: 4000 };
        let out = chunker.apply(file_entity(Some(content))).await.unwrap();
        assert_eq!(out.len(), 3);
        for (i, e) in out.iter().enumerate() {
            let EntityKind::File(f) = &e.kind else { unreachable!() };
            let chunk = f.chunk.as_ref().unwrap();
            assert_eq!(chunk.chunk_index, i as u32);
            assert_eq!(chunk.chunk_count, 3);
        }
    }

    #[tokio::test]
    async fn missing_content_becomes_single_metadata_chunk() {
        let chunker = FileChunker::default();
        let out = chunker.apply(file_entity(None)).await.unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].embeddable_text, "");
    }
}
