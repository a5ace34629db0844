//! Scheduled background tasks using tokio-cron-scheduler.
//!
//! One periodic task drives the whole governance engine: the daily batch
//! runs the escalation pass over active members and then sweeps pending
//! review cases past their deadline.
//!
//! # Architecture
//!
//! ```text
//! Scheduler (daily)
//!     │
//!     ├─► run_escalation_batch()
//!     │       └─► For each active member → warning or review case
//!     └─► sweep_expired_cases()
//!             └─► For each expired pending case → auto-expulsion
//! ```
//!
//! Auto-expiry is a passive deadline, not an alarm: worst-case expiry
//! latency equals the batch interval. That bound is accepted — expiry is
//! also checked lazily on every vote submission.

use anyhow::Result;
use chrono::Utc;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::domains::discipline::actions::run_escalation_batch;
use crate::domains::review::actions::sweep_expired_cases;
use crate::kernel::ServerDeps;

/// Start all scheduled tasks
pub async fn start_scheduler(deps: ServerDeps, schedule: &str) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let batch_deps = deps.clone();
    let governance_job = Job::new_async(schedule, move |_uuid, _lock| {
        let deps = batch_deps.clone();
        Box::pin(async move {
            if let Err(e) = run_governance_batch(&deps).await {
                tracing::error!("Governance batch failed: {}", e);
            }
        })
    })?;

    scheduler.add(governance_job).await?;
    scheduler.start().await?;

    tracing::info!("Scheduled tasks started (governance batch: {})", schedule);
    Ok(scheduler)
}

/// Run one governance batch: escalation pass, then timeout sweep.
///
/// Both halves are idempotent, so an overlapping or retried batch run is
/// harmless: duplicate warnings and cases are suppressed by the storage
/// constraints, and the sweep re-checks each case under a row lock.
pub async fn run_governance_batch(deps: &ServerDeps) -> Result<()> {
    let now = Utc::now();
    tracing::info!("Running governance batch");

    let summary = run_escalation_batch(now, deps).await?;
    tracing::info!(
        evaluated = summary.evaluated,
        warnings_issued = summary.warnings_issued,
        cases_opened = summary.cases_opened,
        "Escalation pass complete"
    );

    let expired = sweep_expired_cases(now, deps).await?;
    tracing::info!(expired, "Timeout sweep complete");

    Ok(())
}
