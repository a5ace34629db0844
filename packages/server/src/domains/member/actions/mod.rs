//! Member query actions
//!
//! Read-side entry points consumed by the admin/committee UI. Affected
//! members always see their current status; while under review they cannot
//! trigger new escalations (the ladder only evaluates active members).

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::common::MemberId;
use crate::domains::discipline::models::InactivityWarning;
use crate::domains::member::models::Member;
use crate::domains::review::models::ReviewCase;
use crate::kernel::ServerDeps;

/// What a member (or the admin UI) sees about a member's standing.
#[derive(Debug, Clone, Serialize)]
pub struct MemberStanding {
    pub member_id: MemberId,
    pub status: String,
    pub warning_level: i32,
    pub expulsion_count: i32,
    pub last_expulsion_at: Option<DateTime<Utc>>,
    pub warnings: Vec<WarningView>,
    pub pending_case_id: Option<crate::common::CaseId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WarningView {
    pub level: i32,
    pub warning_type: String,
    pub months_inactive: i32,
    pub created_at: DateTime<Utc>,
}

/// Assemble the standing view for one member.
pub async fn get_member_standing(member_id: MemberId, deps: &ServerDeps) -> Result<MemberStanding> {
    let member = Member::find_by_id(member_id, &deps.db_pool)
        .await
        .context(format!("Member not found: {}", member_id))?;

    let warnings = InactivityWarning::find_by_member(member_id, &deps.db_pool).await?;
    let pending_case = ReviewCase::find_pending_by_member(member_id, &deps.db_pool).await?;

    Ok(MemberStanding {
        member_id: member.id,
        status: member.status,
        warning_level: member.warning_level,
        expulsion_count: member.expulsion_count,
        last_expulsion_at: member.last_expulsion_at,
        warnings: warnings
            .into_iter()
            .map(|w| WarningView {
                level: w.level,
                warning_type: w.warning_type,
                months_inactive: w.months_inactive,
                created_at: w.created_at,
            })
            .collect(),
        pending_case_id: pending_case.map(|c| c.id),
    })
}
