//! PostgreSQL backend for the ingestion core's persistence contract.
//!
//! This crate depends on `airweave-metadata` for the abstract
//! `MetadataStore` trait and adds the `sqlx`-specific implementation
//! against Postgres, plus the error bridging needed to convert
//! `sqlx::Error` into `DataError`.
//!
//! # Error bridging
//!
//! Due to Rust's orphan rules, `From<sqlx::Error> for DataError` can't
//! be implemented here. Use the [`SqlxErrorExt`] trait instead:
//!
//! ```ignore
//! use airweave_metadata_sql::SqlxErrorExt;
//!
//! let row = sqlx::query_as("SELECT ...")
//!     .fetch_one(&pool)
//!     .await
//!     .map_err(|e| e.into_data_error())?;
//! ```

mod convert;
pub mod error;
pub mod store;

pub use error::{SqlxErrorExt, SqlxResult};
pub use store::PostgresMetadataStore;

/// Re-exports of the most commonly used types from both `airweave-metadata`
/// and this crate.
pub mod prelude {
    pub use crate::{PostgresMetadataStore, SqlxErrorExt};
    pub use airweave_metadata::prelude::*;
}
