use async_trait::async_trait;

use airweave_core::entity::{ChunkData, CodeFileData, Entity, EntityKind};

use crate::error::DagError;
use crate::transformer::Transformer;

/// Splits a code file into chunks along blank-line boundaries, merging
/// consecutive blocks until `max_chunk_chars` so small functions don't
/// each become their own point. A file with no blank-line boundaries
/// (minified output, a single long function) falls back to the same
/// fixed-size windowing the regular file chunker uses.
pub struct CodeChunker {
    pub max_chunk_chars: usize,
}

impl Default for CodeChunker {
    fn default() -> Self {
        Self { max_chunk_chars: 4000 }
    }
}

#[async_trait]
impl Transformer for CodeChunker {
    async fn apply(&self, entity: Entity) -> Result<Vec<Entity>, DagError> {
        let EntityKind::CodeFile(code) = &entity.kind else {
            return Err(DagError::TransformFailed(
                "code chunker applied to a non-code-file entity".into(),
            ));
        };

        let text = match &code.file.content {
            Some(bytes) => std::str::from_utf8(bytes).ok().map(str::to_owned),
            None => None,
        };

        let Some(text) = text else {
            return Ok(vec![single_chunk(entity, String::new())]);
        };

        let blocks = merge_blocks(&text, self.max_chunk_chars.max(1));
        let count = blocks.len().max(1) as u32;

        if blocks.is_empty() {
            return Ok(vec![single_chunk(entity, String::new())]);
        }

        Ok(blocks
            .into_iter()
            .enumerate()
            .map(|(i, block)| {
                let mut out = entity.clone();
                out.embeddable_text = block;
                if let EntityKind::CodeFile(code) = &mut out.kind {
                    code.file.chunk =
                        Some(ChunkData { chunk_index: i as u32, chunk_count: count, vector: None, sparse: None });
                }
                out
            })
            .collect())
    }
}

fn single_chunk(mut entity: Entity, text: String) -> Entity {
    entity.embeddable_text = text;
    if let EntityKind::CodeFile(code) = &mut entity.kind {
        code.file.chunk = Some(ChunkData { chunk_index: 0, chunk_count: 1, vector: None, sparse: None });
    }
    entity
}

fn merge_blocks(text: &str, max_chars: usize) -> Vec<String> {
    let raw_blocks: Vec<&str> = text.split("\n\n").filter(|b| !b.trim().is_empty()).collect();
    if raw_blocks.is_empty() {
        return windowed(text, max_chars);
    }

    let mut blocks = Vec::new();
    let mut current = String::new();
    for block in raw_blocks {
        if !current.is_empty() && current.chars().count() + block.chars().count() > max_chars {
            blocks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push_str("\n\n");
        }
        current.push_str(block);
    }
    if !current.is_empty() {
        blocks.push(current);
    }

    blocks.into_iter().flat_map(|b| windowed(&b, max_chars)).collect()
}

fn windowed(text: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return vec![];
    }
    chars.chunks(max_chars).map(|w| w.iter().collect()).collect()
}
