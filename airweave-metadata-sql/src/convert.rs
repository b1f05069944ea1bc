//! Enum <-> `TEXT` column conversions. Kept explicit (rather than an
//! sqlx `Type` derive with `#[sqlx(type_name = ...)]`) so the Postgres
//! schema can use a plain `TEXT CHECK (... IN (...))` column instead of
//! a native enum type, which is one less migration to coordinate when a
//! status variant is added.

use airweave_core::billing::BillingPeriodStatus;
use airweave_core::connection::SourceConnectionStatus;
use airweave_core::sync::{JobStatus, SyncStatus};

use crate::error::SqlxErrorExt;
use airweave_metadata::error::DataError;

pub fn source_connection_status_to_str(status: SourceConnectionStatus) -> &'static str {
    match status {
        SourceConnectionStatus::Active => "active",
        SourceConnectionStatus::Inactive => "inactive",
        SourceConnectionStatus::Error => "error",
    }
}

pub fn source_connection_status_from_str(s: &str) -> Result<SourceConnectionStatus, DataError> {
    match s {
        "active" => Ok(SourceConnectionStatus::Active),
        "inactive" => Ok(SourceConnectionStatus::Inactive),
        "error" => Ok(SourceConnectionStatus::Error),
        other => Err(DataError::Other(format!("unknown source connection status: {other}"))),
    }
}

pub fn sync_status_to_str(status: SyncStatus) -> &'static str {
    match status {
        SyncStatus::Active => "active",
        SyncStatus::Inactive => "inactive",
        SyncStatus::Deleted => "deleted",
    }
}

pub fn sync_status_from_str(s: &str) -> Result<SyncStatus, DataError> {
    match s {
        "active" => Ok(SyncStatus::Active),
        "inactive" => Ok(SyncStatus::Inactive),
        "deleted" => Ok(SyncStatus::Deleted),
        other => Err(DataError::Other(format!("unknown sync status: {other}"))),
    }
}

pub fn job_status_to_str(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Pending => "pending",
        JobStatus::InProgress => "in_progress",
        JobStatus::Completed => "completed",
        JobStatus::Failed => "failed",
        JobStatus::Cancelled => "cancelled",
    }
}

pub fn job_status_from_str(s: &str) -> Result<JobStatus, DataError> {
    match s {
        "pending" => Ok(JobStatus::Pending),
        "in_progress" => Ok(JobStatus::InProgress),
        "completed" => Ok(JobStatus::Completed),
        "failed" => Ok(JobStatus::Failed),
        "cancelled" => Ok(JobStatus::Cancelled),
        other => Err(DataError::Other(format!("unknown job status: {other}"))),
    }
}

pub fn billing_status_to_str(status: BillingPeriodStatus) -> &'static str {
    match status {
        BillingPeriodStatus::Active => "active",
        BillingPeriodStatus::Trial => "trial",
        BillingPeriodStatus::Grace => "grace",
        BillingPeriodStatus::EndedUnpaid => "ended_unpaid",
        BillingPeriodStatus::Completed => "completed",
    }
}

pub fn billing_status_from_str(s: &str) -> Result<BillingPeriodStatus, DataError> {
    match s {
        "active" => Ok(BillingPeriodStatus::Active),
        "trial" => Ok(BillingPeriodStatus::Trial),
        "grace" => Ok(BillingPeriodStatus::Grace),
        "ended_unpaid" => Ok(BillingPeriodStatus::EndedUnpaid),
        "completed" => Ok(BillingPeriodStatus::Completed),
        other => Err(DataError::Other(format!("unknown billing status: {other}"))),
    }
}

pub fn plan_from_str(s: &str) -> Result<airweave_core::billing::BillingPlan, DataError> {
    use airweave_core::billing::BillingPlan;
    match s {
        "developer" => Ok(BillingPlan::Developer),
        "pro" => Ok(BillingPlan::Pro),
        "team" => Ok(BillingPlan::Team),
        "enterprise" => Ok(BillingPlan::Enterprise),
        other => Err(DataError::Other(format!("unknown billing plan: {other}"))),
    }
}

pub fn plan_to_str(plan: airweave_core::billing::BillingPlan) -> &'static str {
    use airweave_core::billing::BillingPlan;
    match plan {
        BillingPlan::Developer => "developer",
        BillingPlan::Pro => "pro",
        BillingPlan::Team => "team",
        BillingPlan::Enterprise => "enterprise",
    }
}

pub(crate) fn map_err(err: sqlx::Error) -> DataError {
    err.into_data_error()
}
