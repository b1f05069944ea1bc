/// The persisted snapshot is `entity_id -> opaque string`, the shape
/// `MetadataStore` commits to. The engine packs the entity's chunk
/// count alongside its content hash in that string (`"{count}:{hash}"`)
/// so a deleted entity's exact prior point ids can be reconstructed
/// without widening the store's schema for a detail only the engine
/// cares about.
pub fn encode(chunk_count: u32, content_hash: &str) -> String {
    format!("{chunk_count}:{content_hash}")
}

pub fn decode(entry: &str) -> Option<(u32, &str)> {
    let (count, hash) = entry.split_once(':')?;
    Some((count.parse().ok()?, hash))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let encoded = encode(3, "abc123");
        assert_eq!(decode(&encoded), Some((3, "abc123")));
    }

    #[test]
    fn rejects_malformed_entry() {
        assert_eq!(decode("no-colon-here"), None);
    }
}
