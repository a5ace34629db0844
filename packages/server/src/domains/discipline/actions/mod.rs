//! Escalation actions
//!
//! `evaluate_member` is the per-member ladder step; `run_escalation_batch`
//! applies it across all active members. Both are idempotent: re-running
//! with unchanged inputs produces no new state, because warning issuance
//! and case opening are guarded by storage constraints.

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::domains::discipline::activity::{months_inactive, tenure_months};
use crate::domains::discipline::errors::EscalationError;
use crate::domains::discipline::ladder::{
    applicable_stage, warning_message, COUNCIL_REVIEW_LEVEL, TENURE_GRACE_MONTHS,
};
use crate::domains::discipline::models::InactivityWarning;
use crate::domains::member::models::Member;
use crate::domains::review::actions::open_inactivity_case;
use crate::domains::review::models::ReviewCase;
use crate::kernel::ServerDeps;

/// What one escalation evaluation did.
#[derive(Debug)]
pub enum EscalationOutcome {
    /// Nothing to do: current on the ladder, too young, or already handled.
    None,
    WarningIssued(InactivityWarning),
    CaseOpened(ReviewCase),
}

/// Counters for one batch run.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub evaluated: usize,
    pub warnings_issued: usize,
    pub cases_opened: usize,
}

/// Evaluate the escalation ladder for one member.
///
/// Preconditions: the member must be active (anything else is an explicit
/// [`EscalationError::MemberNotActive`]); members with less than three whole
/// months of tenure are skipped entirely. A member who gave a referral since
/// the last run has `months_inactive` back at 0 and falls off the ladder
/// without any explicit reset step.
pub async fn evaluate_member(
    member: &Member,
    now: DateTime<Utc>,
    deps: &ServerDeps,
) -> Result<EscalationOutcome, EscalationError> {
    if !member.is_active() {
        return Err(EscalationError::MemberNotActive {
            status: member.status.clone(),
        });
    }
    if tenure_months(member, now) < TENURE_GRACE_MONTHS {
        return Ok(EscalationOutcome::None);
    }

    let months = months_inactive(member, now);
    let highest_issued = InactivityWarning::highest_level_for(member.id, &deps.db_pool).await?;

    let stage = match applicable_stage(months, highest_issued) {
        Some(stage) => stage,
        None => return Ok(EscalationOutcome::None),
    };

    if stage.level == COUNCIL_REVIEW_LEVEL {
        // Level 4 opens a review case; the case itself is the level-4
        // artifact, so no warning row is written.
        return match open_inactivity_case(member, months, now, deps).await? {
            Some(case) => {
                info!(
                    member_id = %member.id,
                    case_id = %case.id,
                    months_inactive = months,
                    "Review case opened for inactivity"
                );
                Ok(EscalationOutcome::CaseOpened(case))
            }
            // A pending case already exists (earlier run or concurrent batch).
            None => Ok(EscalationOutcome::None),
        };
    }

    let message = warning_message(&stage, months);
    let recorded = InactivityWarning::record(
        member.id,
        stage.level,
        stage.warning_type,
        &message,
        months,
        &deps.db_pool,
    )
    .await?;

    let warning = match recorded {
        Some(warning) => warning,
        // Idempotency collision: the warning already exists.
        None => return Ok(EscalationOutcome::None),
    };

    let mut conn = deps.db_pool.acquire().await?;
    Member::raise_warning_level(member.id, stage.level, &mut *conn).await?;
    drop(conn);

    info!(
        member_id = %member.id,
        level = stage.level,
        months_inactive = months,
        "Inactivity warning issued"
    );

    // Fire-and-forget: delivery failure never unwinds the warning record.
    if let Some(token) = &member.expo_push_token {
        if let Err(e) = deps
            .push_service
            .send_notification(
                token,
                "Inactivity warning",
                &warning.message,
                serde_json::json!({
                    "kind": "inactivity_warning",
                    "level": warning.level,
                    "target_url": "/membership/standing",
                }),
            )
            .await
        {
            warn!(member_id = %member.id, error = %e, "Warning notification failed (non-fatal)");
        }
    }

    Ok(EscalationOutcome::WarningIssued(warning))
}

/// Run the escalation pass over all active members.
///
/// Per-member failures are logged and skipped; one bad row must not stall
/// governance for everyone else. A member expelled by a racing sweep between
/// the listing and their evaluation surfaces as `MemberNotActive` and is
/// skipped the same way.
pub async fn run_escalation_batch(now: DateTime<Utc>, deps: &ServerDeps) -> Result<BatchSummary> {
    let members = Member::find_active(&deps.db_pool).await?;
    let mut summary = BatchSummary {
        evaluated: members.len(),
        ..Default::default()
    };

    for member in &members {
        match evaluate_member(member, now, deps).await {
            Ok(EscalationOutcome::WarningIssued(_)) => summary.warnings_issued += 1,
            Ok(EscalationOutcome::CaseOpened(_)) => summary.cases_opened += 1,
            Ok(EscalationOutcome::None) => {}
            Err(e) => {
                warn!(member_id = %member.id, error = %e, "Escalation evaluation failed");
            }
        }
    }

    Ok(summary)
}
