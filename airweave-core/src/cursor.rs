use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::SourceConnectionId;

/// Connector-opaque incremental-sync bookmark. Connectors read and
/// write arbitrary keys (last-modified timestamps, page tokens, row
/// ids) through this map; the core never interprets its contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cursor {
    pub source_connection_id: SourceConnectionId,
    pub data: BTreeMap<String, Value>,
}

impl Cursor {
    pub fn new(source_connection_id: SourceConnectionId) -> Self {
        Self {
            source_connection_id,
            data: BTreeMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.data.insert(key.into(), value);
    }

    /// Merges fields from `updates` into this cursor, overwriting any
    /// existing keys. Used to persist a connector's end-of-stream state
    /// without clobbering keys it didn't touch this run.
    pub fn merge(&mut self, updates: BTreeMap<String, Value>) {
        self.data.extend(updates);
    }
}
