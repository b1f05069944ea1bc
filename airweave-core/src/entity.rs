use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ids::EntityDefinitionId;

/// A parent in an entity's ancestry chain, carried along so downstream
/// consumers (search results, UI breadcrumbing) can show where a chunk
/// came from without re-fetching the whole source tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Breadcrumb {
    pub entity_id: String,
    pub name: String,
    pub entity_definition_id: EntityDefinitionId,
}

/// Describes the shape entities of a given kind take: which fields exist,
/// what module/class produced them. Connectors register one per entity
/// type they emit; the DAG router matches on `(producer, definition_id)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityDefinition {
    pub id: EntityDefinitionId,
    pub name: String,
    pub module: String,
    pub class: String,
    pub schema: Value,
}

impl EntityDefinition {
    /// Fixed id assigned to entities produced directly from a database
    /// row without a more specific definition (used by connectors that
    /// mirror arbitrary tables, e.g. Postgres/Salesforce custom objects).
    pub fn polymorphic_table() -> EntityDefinitionId {
        EntityDefinitionId(uuid::Uuid::from_u128(0x504f_4c59_4d4f_5250_4849_4331_4142_4c45))
    }

    /// Fixed id for the synthetic "parent" wrapper entity a connector
    /// emits before its children, so the DAG can route structural
    /// containers (folders, channels) distinctly from their contents.
    pub fn parent() -> EntityDefinitionId {
        EntityDefinitionId(uuid::Uuid::from_u128(0x5041_5245_4e54_2020_2020_2020_2020_2020))
    }

    /// Fixed id for a generic text chunk with no source-specific schema.
    pub fn chunk() -> EntityDefinitionId {
        EntityDefinitionId(uuid::Uuid::from_u128(0x4348_554e_4b20_2020_2020_2020_2020_2020))
    }
}

/// A sparse (term-weighted) vector, used alongside the dense embedding
/// for hybrid BM25 + cosine search.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SparseVector {
    pub indices: Vec<u32>,
    pub values: Vec<f32>,
}

/// Fields specific to a chunk produced by splitting a larger document or
/// file. `chunk_index`/`chunk_count` let downstream ranking reconstruct
/// ordering within the parent.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChunkData {
    pub chunk_index: u32,
    pub chunk_count: u32,
    pub vector: Option<Vec<f32>>,
    pub sparse: Option<SparseVector>,
}

/// Fields specific to an entity backed by a downloadable file. `content`
/// is populated only after materialization; before that the entity
/// carries just the `download_url` and is fetched lazily by the
/// connector's file pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileData {
    pub download_url: Option<String>,
    pub headers: Vec<(String, String)>,
    pub mime_type: Option<String>,
    pub content: Option<Vec<u8>>,
    pub chunk: Option<ChunkData>,
}

/// A file entity known (or detected) to contain source code, carrying
/// the language so the code chunker/summarizer transformers can select
/// an appropriate strategy.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CodeFileData {
    pub language: Option<String>,
    pub file: FileData,
}

/// An entity mirrored from an arbitrary database row (Postgres tables,
/// Salesforce objects, Airtable records). The row's columns are kept as
/// a generic JSON map since the schema isn't known ahead of time.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PolymorphicData {
    pub table: String,
    pub columns: Vec<String>,
    pub primary_keys: Vec<String>,
    pub row: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EntityKind {
    Chunk(ChunkData),
    File(FileData),
    CodeFile(CodeFileData),
    Polymorphic(PolymorphicData),
}

/// A unit of content emitted by a connector and routed through the DAG
/// to one or more destinations. `entity_id` is the connector's own
/// identifier for the underlying resource (stable across syncs);
/// `payload` is the entity's own fields, used for content hashing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub entity_id: String,
    pub entity_definition_id: EntityDefinitionId,
    pub source_name: String,
    pub breadcrumbs: Vec<Breadcrumb>,
    pub payload: Value,
    pub embeddable_text: String,
    pub kind: EntityKind,
}

impl Entity {
    pub fn content_hash(&self) -> String {
        crate::hashing::content_hash(&self.payload)
    }

    pub fn chunk_index(&self) -> u32 {
        match &self.kind {
            EntityKind::Chunk(c) => c.chunk_index,
            EntityKind::File(f) => f.chunk.as_ref().map(|c| c.chunk_index).unwrap_or(0),
            EntityKind::CodeFile(c) => c.file.chunk.as_ref().map(|c| c.chunk_index).unwrap_or(0),
            EntityKind::Polymorphic(_) => 0,
        }
    }

    pub fn vector(&self) -> Option<&[f32]> {
        match &self.kind {
            EntityKind::Chunk(c) => c.vector.as_deref(),
            EntityKind::File(f) => f.chunk.as_ref().and_then(|c| c.vector.as_deref()),
            EntityKind::CodeFile(c) => c.file.chunk.as_ref().and_then(|c| c.vector.as_deref()),
            EntityKind::Polymorphic(_) => None,
        }
    }
}
