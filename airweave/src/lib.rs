//! Airweave — a single facade crate over the ingestion and search core.
//!
//! Import everything enabled for this build with:
//!
//! ```ignore
//! use airweave::prelude::*;
//! ```
//!
//! # Feature flags
//!
//! | Feature     | Default | Crates                                                                                    |
//! |-------------|---------|--------------------------------------------------------------------------------------------|
//! | `sync`      | **yes** | `airweave-security`, `airweave-connector`, `airweave-dag`, `airweave-quota`, `airweave-pubsub`, `airweave-sync` |
//! | `search`    | **yes** | `airweave-search`, `airweave-quota`                                                       |
//! | `scheduler` | **yes** | `airweave-scheduler` (implies `sync`)                                                      |
//! | `cache`     | no      | `airweave-cache`                                                                           |
//! | `ratelimit` | no      | `airweave-ratelimit`                                                                       |
//! | `postgres`  | no      | `airweave-metadata-sql`                                                                    |
//! | `full`      | no      | All of the above                                                                           |
//!
//! `airweave-core`, `airweave-store`, and `airweave-metadata` are always
//! present: every feature combination needs the shared domain types,
//! the vector store contract, and the metadata store contract.

pub use airweave_core as core;
pub use airweave_metadata as metadata;
pub use airweave_store as store;

#[cfg(feature = "security")]
pub use airweave_security as security;

#[cfg(feature = "connector")]
pub use airweave_connector as connector;

#[cfg(feature = "dag")]
pub use airweave_dag as dag;

#[cfg(feature = "quota")]
pub use airweave_quota as quota;

#[cfg(feature = "pubsub")]
pub use airweave_pubsub as pubsub;

#[cfg(feature = "sync")]
pub use airweave_sync as sync;

#[cfg(feature = "scheduler")]
pub use airweave_scheduler as scheduler;

#[cfg(feature = "search")]
pub use airweave_search as search;

#[cfg(feature = "cache")]
pub use airweave_cache as cache;

#[cfg(feature = "ratelimit")]
pub use airweave_ratelimit as ratelimit;

#[cfg(feature = "postgres")]
pub use airweave_metadata_sql as metadata_sql;

/// Unified prelude — `use airweave::prelude::*` pulls in the domain
/// types plus whichever capability crates this build has enabled.
pub mod prelude {
    pub use airweave_core::prelude::*;
    pub use airweave_metadata::prelude::*;
    pub use airweave_store::prelude::*;

    #[cfg(feature = "security")]
    pub use airweave_security::prelude::*;

    #[cfg(feature = "connector")]
    pub use airweave_connector::prelude::*;

    #[cfg(feature = "dag")]
    pub use airweave_dag::prelude::*;

    #[cfg(feature = "quota")]
    pub use airweave_quota::prelude::*;

    #[cfg(feature = "sync")]
    pub use airweave_sync::prelude::*;

    #[cfg(feature = "scheduler")]
    pub use airweave_scheduler::prelude::*;

    #[cfg(feature = "search")]
    pub use airweave_search::prelude::*;
}
