//! Reentry actions
//!
//! Filing is member-initiated (through the external UI); the decision is an
//! admin human-in-the-loop. The eligibility engine gates both ends: filings
//! that can never succeed are auto-rejected with an explanatory note, and an
//! approval for a non-eligible member is refused here regardless of what the
//! caller asserts.

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::common::{MemberId, ReentryRequestId};
use crate::domains::member::models::{Member, MemberStatus};
use crate::domains::reentry::eligibility::{classify, ReentryEligibility};
use crate::domains::reentry::errors::ReentryError;
use crate::domains::reentry::models::{ReentryRequest, RequestStatus};
use crate::kernel::ServerDeps;

/// File a reentry request on behalf of an expelled member.
///
/// Non-eligible filings (cooldown running, permanent ban) are persisted as
/// auto-rejected requests so the trail stays auditable without requiring
/// admin attention. A duplicate filing while one is pending returns the
/// existing request.
pub async fn file_reentry_request(
    member_id: MemberId,
    reason: &str,
    now: DateTime<Utc>,
    deps: &ServerDeps,
) -> Result<ReentryRequest, ReentryError> {
    let member = Member::find_by_id_optional(member_id, &deps.db_pool)
        .await?
        .ok_or(ReentryError::MemberNotFound(member_id))?;

    match member.status() {
        Some(MemberStatus::Expelled) | Some(MemberStatus::Banned) => {}
        _ => return Err(ReentryError::NotExpelled),
    }

    match classify(member.expulsion_count, member.last_expulsion_at, now) {
        ReentryEligibility::Permanent => {
            let request = ReentryRequest::create_auto_rejected(
                member_id,
                reason,
                "Auto-rejected: permanently banned after repeated expulsions.",
                now,
                &deps.db_pool,
            )
            .await?;
            info!(member_id = %member_id, "Reentry request auto-rejected (permanent ban)");
            Ok(request)
        }
        ReentryEligibility::Waiting { available_at } => {
            let request = ReentryRequest::create_auto_rejected(
                member_id,
                reason,
                &format!(
                    "Auto-rejected: reentry cooldown active until {}.",
                    available_at.format("%Y-%m-%d")
                ),
                now,
                &deps.db_pool,
            )
            .await?;
            info!(member_id = %member_id, %available_at, "Reentry request auto-rejected (cooldown)");
            Ok(request)
        }
        ReentryEligibility::Eligible => {
            match ReentryRequest::create_pending(member_id, reason, &deps.db_pool).await? {
                Some(request) => {
                    info!(member_id = %member_id, request_id = %request.id, "Reentry request filed");
                    Ok(request)
                }
                // Idempotency collision: a pending request already exists.
                None => {
                    let existing =
                        ReentryRequest::find_pending_by_member(member_id, &deps.db_pool)
                            .await?
                            .ok_or_else(|| {
                                ReentryError::Internal(anyhow::anyhow!(
                                    "pending reentry request vanished mid-filing"
                                ))
                            })?;
                    Ok(existing)
                }
            }
        }
    }
}

/// Decide a pending reentry request (admin human-in-the-loop).
///
/// Eligibility is re-classified at decision time: approving a permanently
/// banned or still-cooling-down member fails here even if the request
/// predates the disqualifying event. On approval the member returns to
/// active with expulsion history untouched — a future second expulsion must
/// be recognized as the second one.
pub async fn decide_reentry(
    request_id: ReentryRequestId,
    admin_id: Uuid,
    approve: bool,
    admin_notes: Option<&str>,
    now: DateTime<Utc>,
    deps: &ServerDeps,
) -> Result<ReentryRequest, ReentryError> {
    let mut tx = deps.db_pool.begin().await.map_err(ReentryError::Database)?;

    let request = ReentryRequest::lock_by_id(request_id, &mut *tx)
        .await?
        .ok_or(ReentryError::RequestNotFound(request_id))?;

    if !request.is_pending() {
        return Err(ReentryError::AlreadyReviewed {
            status: request.status,
        });
    }

    let member = Member::find_by_id_optional(request.member_id, &deps.db_pool)
        .await?
        .ok_or(ReentryError::MemberNotFound(request.member_id))?;

    if approve {
        match classify(member.expulsion_count, member.last_expulsion_at, now) {
            ReentryEligibility::Permanent => return Err(ReentryError::PermanentlyBanned),
            ReentryEligibility::Waiting { available_at } => {
                return Err(ReentryError::CooldownActive { available_at })
            }
            ReentryEligibility::Eligible => {}
        }

        if Member::reinstate(member.id, &mut *tx).await?.is_none() {
            // Guarded update found the member not expelled — banned members
            // never reach here (Permanent above), so this is a stale request
            // for someone already reinstated.
            return Err(ReentryError::NotExpelled);
        }
    }

    let status = if approve {
        RequestStatus::Approved
    } else {
        RequestStatus::Rejected
    };
    let request =
        ReentryRequest::mark_reviewed(request_id, status, admin_id, admin_notes, now, &mut *tx)
            .await?;

    tx.commit().await.map_err(ReentryError::Database)?;

    info!(
        request_id = %request.id,
        member_id = %request.member_id,
        status = %request.status,
        "Reentry request decided"
    );

    if let Some(token) = &member.expo_push_token {
        let (title, body) = if approve {
            ("Welcome back", "Your reentry request was approved. Your membership is active again.")
        } else {
            ("Reentry request declined", "Your reentry request was not approved.")
        };
        if let Err(e) = deps
            .push_service
            .send_notification(
                token,
                title,
                body,
                serde_json::json!({ "kind": "reentry_decided", "request_id": request.id }),
            )
            .await
        {
            warn!(member_id = %member.id, error = %e, "Reentry notification failed (non-fatal)");
        }
    }

    Ok(request)
}
