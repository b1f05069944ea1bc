//! Drives a single sync job: connector stream in, DAG-routed and
//! embedded points out, diffed against the previous run's content
//! hashes so unchanged entities are never re-embedded and entities the
//! connector stopped producing are deleted once the run succeeds.

pub mod engine;
pub mod snapshot;

pub mod prelude {
    pub use crate::engine::{RunRequest, SyncEngine, SyncEngineConfig};
}
