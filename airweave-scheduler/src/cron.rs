use std::str::FromStr;

use chrono::{DateTime, Utc};

#[derive(Debug)]
pub struct CronError(pub String);

impl std::fmt::Display for CronError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid cron expression: {}", self.0)
    }
}

impl std::error::Error for CronError {}

/// `cron::Schedule` requires a leading seconds field; connection owners
/// write standard 5-field expressions (`*/5 * * * *`), so a 5-field
/// expression is treated as having an implicit `0` seconds field. An
/// expression that already has 6 fields (or is malformed) is passed
/// through unchanged and left for `Schedule::from_str` to accept or reject.
fn normalize(expr: &str) -> String {
    if expr.split_whitespace().count() == 5 {
        format!("0 {expr}")
    } else {
        expr.to_string()
    }
}

/// Computes the next run time for `expr` seeded from `last_run`, the way
/// the next_scheduled_run a sync carries gets recomputed each tick: the
/// candidate is the first occurrence strictly after `last_run`, but if
/// that candidate already elapsed (the sync hasn't run in a while, or
/// this is its first run and `last_run` is the epoch), it's recomputed
/// from `now` instead so a long-dormant sync gets one near-term run
/// rather than instantly catching up once.
pub fn next_run(expr: &str, last_run: DateTime<Utc>, now: DateTime<Utc>) -> Result<DateTime<Utc>, CronError> {
    let schedule = ::cron::Schedule::from_str(&normalize(expr)).map_err(|e| CronError(e.to_string()))?;
    let candidate = schedule
        .after(&last_run)
        .next()
        .ok_or_else(|| CronError(format!("schedule {expr} has no future occurrences")))?;
    if candidate < now {
        schedule
            .after(&now)
            .next()
            .ok_or_else(|| CronError(format!("schedule {expr} has no future occurrences")))
    } else {
        Ok(candidate)
    }
}
