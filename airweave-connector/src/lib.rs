//! `Connector` trait framework shared by every source integration:
//! rate limiting, retry with jittered backoff, pagination, file
//! materialization, and an opt-in bounded-concurrency partition worker
//! pool (`batch_generation`). Connectors own only their own API calls;
//! everything in this list is a framework concern layered around them.

pub mod connector;
pub mod error;
pub mod file_materializer;
pub mod pagination;
pub mod rate_limit;
pub mod retry;
pub mod worker_pool;

pub mod prelude {
    pub use crate::connector::{BatchGenerationConfig, Connector};
    pub use crate::error::ConnectorError;
    pub use crate::file_materializer::{FileMaterializer, FileSource};
    pub use crate::pagination::{paginate, PageToken};
    pub use crate::rate_limit::{ConnectorRateLimiter, RateLimitBudget};
    pub use crate::retry::{execute_with_retry, RetryConfig};
    pub use crate::worker_pool::run_batch_generation;
}
