//! Cron-driven scheduling for sync jobs.
//!
//! A single cooperative loop ticks once a second, recomputes each active
//! sync's next run the way a cron tool would, and admits a new job only
//! when the store confirms no non-terminal job for that sync already
//! exists. Actually starting the job's work is delegated to a
//! `SyncTrigger` the scheduler knows nothing about beyond its trait.

mod cron;
mod scheduler;
mod trigger;

pub use scheduler::{Scheduler, SchedulerConfig};
pub use trigger::SyncTrigger;

pub mod prelude {
    pub use crate::{Scheduler, SchedulerConfig, SyncTrigger};
}
