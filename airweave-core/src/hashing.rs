use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::ids::CollectionId;

/// Deterministic id for a vector store point, derived from the owning
/// collection, the source entity id, and its chunk index (zero for
/// entities that aren't chunked).
///
/// Stable across re-syncs: the same logical chunk of the same entity
/// always maps to the same point, which is what makes diffing against
/// the previous sync an update-in-place rather than a delete-and-insert.
pub fn point_id(collection_id: CollectionId, entity_id: &str, chunk_index: u32) -> String {
    let mut hasher = Sha256::new();
    hasher.update(collection_id.0.as_bytes());
    hasher.update(b"\0");
    hasher.update(entity_id.as_bytes());
    hasher.update(b"\0");
    hasher.update(chunk_index.to_le_bytes());
    let digest = hasher.finalize();
    hex::encode(digest)
}

/// Serializes a JSON value with object keys sorted recursively, so
/// semantically identical payloads always produce byte-identical output
/// regardless of field insertion order.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&serde_json::to_string(key).unwrap_or_default());
                out.push(':');
                write_canonical(&map[*key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        other => out.push_str(&other.to_string()),
    }
}

/// Content hash used to detect whether an entity changed since the last
/// sync: same canonical JSON, same hash, entity is skipped untouched.
pub fn content_hash(payload: &Value) -> String {
    let canonical = canonical_json(payload);
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}

mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        let bytes = bytes.as_ref();
        let mut out = String::with_capacity(bytes.len() * 2);
        for b in bytes {
            out.push_str(&format!("{b:02x}"));
        }
        out
    }
}
