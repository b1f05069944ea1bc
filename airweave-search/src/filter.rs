//! Filter synthesis: AND-merges a caller-supplied filter with one
//! produced by query interpretation. Both sides are opaque
//! `serde_json::Value`s as far as this crate is concerned; only the
//! vector store backend assigns them meaning.

use serde_json::{json, Value};

/// Merges `caller` and `interpreted` filters. Either side may be
/// absent; when both are present the result is `{"and": [caller,
/// interpreted]}` rather than a deep object merge, since the two
/// filters may describe overlapping or even conflicting keys and an
/// explicit AND lets the backend apply both without one silently
/// overwriting the other.
pub fn synthesize(caller: Option<Value>, interpreted: Option<Value>) -> Option<Value> {
    match (caller, interpreted) {
        (Some(a), Some(b)) if a == b => Some(a),
        (Some(a), Some(b)) => Some(json!({"and": [a, b]})),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}
