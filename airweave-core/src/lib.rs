//! Shared domain types and error taxonomy for the ingestion and search
//! core. Every other crate in the workspace depends on this one for its
//! identifiers, entity model, and `CoreError`; it depends on nothing
//! else in the workspace.

pub mod billing;
pub mod collection;
pub mod connection;
pub mod cursor;
pub mod entity;
pub mod error;
pub mod hashing;
pub mod ids;
pub mod organization;
pub mod providers;
pub mod sync;
pub mod usage;

pub mod prelude {
    pub use crate::billing::{BillingPeriodStatus, BillingPlan};
    pub use crate::collection::Collection;
    pub use crate::connection::{AuthMethod, SourceConnection, SourceConnectionStatus};
    pub use crate::cursor::Cursor;
    pub use crate::entity::{
        Breadcrumb, ChunkData, CodeFileData, Entity, EntityDefinition, EntityKind, FileData,
        PolymorphicData, SparseVector,
    };
    pub use crate::error::{CoreError, CoreResult};
    pub use crate::hashing::{canonical_json, content_hash, point_id};
    pub use crate::ids::{
        CollectionId, EntityDefinitionId, OrganizationId, SourceConnectionId, SyncDagId, SyncId,
        SyncJobId,
    };
    pub use crate::organization::Organization;
    pub use crate::providers::{
        ChatMessage, ChatRole, CompletionEvent, EmbeddingProvider, LLMProvider, SparseEncoder,
    };
    pub use crate::sync::{JobCounters, JobStatus, Sync, SyncJob, SyncStatus};
    pub use crate::usage::{ActionType, Usage, UsageLimit};
}
