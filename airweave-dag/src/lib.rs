//! DAG validation and routing for a sync: builds a `(producer, entity
//! type) -> transformer` route table once per sync, then recursively
//! routes each entity a connector emits through its structural
//! chunkers, any source-specific transformers, and finally an embedder
//! before it reaches its destination(s).

pub mod builtin;
pub mod error;
pub mod graph;
pub mod router;
pub mod transformer;

pub mod prelude {
    pub use crate::builtin::{CodeChunker, CodeSummarizer, Embedder, FieldChunker, FileChunker};
    pub use crate::error::DagError;
    pub use crate::graph::{DagEdge, DagNode, NodeId, NodeKind, SyncDag};
    pub use crate::router::{DagRouter, DagRouterBuilder};
    pub use crate::transformer::Transformer;
}
