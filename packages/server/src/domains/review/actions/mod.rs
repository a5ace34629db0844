//! Review case actions
//!
//! Entry-point actions for the disciplinary case lifecycle: opening cases,
//! casting committee votes, and sweeping expired cases.
//!
//! Every authoritative transition happens inside a single database
//! transaction with a row lock on the case. Notifications and ledger
//! instructions are dispatched after commit and are best-effort: a failed
//! push must never leave a member stuck under review.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use crate::common::{CaseId, MemberId};
use crate::domains::ban_registry::actions::record_permanent_ban;
use crate::domains::member::models::{Member, MemberStatus};
use crate::domains::review::errors::VoteError;
use crate::domains::review::models::{CaseStatus, ReviewCase, TriggerType, Vote};
use crate::domains::review::quorum::{expulsion_rules, QuorumChoice, VoteChoice};
use crate::kernel::ServerDeps;

/// Voting window for a fresh case.
pub const AUTO_EXPIRE_DAYS: i64 = 7;

/// How far an extend majority pushes the deadline.
pub const EXTENSION_DAYS: i64 = 30;

/// Points deducted when a misconduct case resolves against the member.
/// Inactivity-driven expulsion does not touch the ledger.
pub const MISCONDUCT_PENALTY_POINTS: i32 = 100;

/// What a vote submission did to the case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// Vote recorded; no majority yet.
    Pending,
    /// This vote reached the expel majority; the member is out.
    Expelled,
    /// This vote reached the absolve majority; the member is active again.
    Absolved,
    /// This vote reached the extend majority; the deadline moved out.
    Extended,
    /// The case was already decided by quorum. The vote is recorded for the
    /// historical trail but changes nothing.
    AlreadyDecided,
}

#[derive(Debug)]
pub struct CastVoteResult {
    pub case: ReviewCase,
    pub vote: Vote,
    pub outcome: VoteOutcome,
}

// ============================================================================
// Entry Point: Open a case
// ============================================================================

/// Open a review case for level-4 inactivity.
///
/// The evidence snapshot is captured here: later referrals change the
/// member's live state but never what this case was opened over.
pub async fn open_inactivity_case(
    member: &Member,
    months_inactive: i32,
    now: DateTime<Utc>,
    deps: &ServerDeps,
) -> Result<Option<ReviewCase>> {
    let details = serde_json::json!({
        "months_inactive": months_inactive,
        "last_given_referral_at": member.last_given_referral_at,
    });
    open_case(member, TriggerType::Inactivity, details, now, deps).await
}

/// Open a review case from a misconduct report (alternate trigger).
///
/// The reporting flow supplies its own opaque evidence snapshot.
pub async fn open_misconduct_case(
    member: &Member,
    evidence: serde_json::Value,
    now: DateTime<Utc>,
    deps: &ServerDeps,
) -> Result<Option<ReviewCase>> {
    open_case(member, TriggerType::Misconduct, evidence, now, deps).await
}

/// Open a review case and move the member under review.
///
/// Returns None when the member already has a pending case or is not active
/// — both are idempotency collisions, not errors.
pub async fn open_case(
    member: &Member,
    trigger_type: TriggerType,
    trigger_details: serde_json::Value,
    now: DateTime<Utc>,
    deps: &ServerDeps,
) -> Result<Option<ReviewCase>> {
    // Roster read is outside the transaction: it is read-only and owned by
    // the ranking provider. The snapshot stored on the case is what governs
    // eligibility from here on.
    let committee = deps.committee_roster.current_committee().await?;
    let rules = expulsion_rules();
    if committee.len() != rules.committee_size {
        warn!(
            expected = rules.committee_size,
            actual = committee.len(),
            "Committee roster size differs from the fixed committee size"
        );
    }

    let mut tx = deps.db_pool.begin().await?;

    let case = ReviewCase::create(
        member.id,
        trigger_type,
        trigger_details,
        &committee,
        now + Duration::days(AUTO_EXPIRE_DAYS),
        &mut *tx,
    )
    .await?;

    let case = match case {
        Some(case) => case,
        None => {
            // A pending case already exists for this member.
            tx.rollback().await?;
            return Ok(None);
        }
    };

    if Member::set_under_review(member.id, &mut *tx).await?.is_none() {
        // Member stopped being active since we loaded them (expelled by a
        // racing sweep, or already under review). No case to open.
        tx.rollback().await?;
        return Ok(None);
    }

    tx.commit().await?;

    info!(
        case_id = %case.id,
        member_id = %member.id,
        trigger_type = trigger_type.as_str(),
        "Review case opened"
    );

    notify_member(
        deps,
        member,
        "Membership under review",
        "Your membership has been referred to the council for review.",
        serde_json::json!({ "kind": "case_opened", "case_id": case.id, "target_url": "/membership/standing" }),
    )
    .await;

    notify_committee(
        deps,
        &case.committee_snapshot,
        "New review case",
        &format!("A {} case awaits your vote.", trigger_type.as_str()),
        serde_json::json!({ "kind": "case_opened", "case_id": case.id, "target_url": format!("/council/cases/{}", case.id) }),
    )
    .await;

    Ok(Some(case))
}

// ============================================================================
// Entry Point: Cast a vote
// ============================================================================

/// Cast a committee vote on a pending case.
///
/// One atomic unit: vote insert, tally, and — on majority — the case
/// transition and member side effects all commit before this returns. Of two
/// near-simultaneous voters, exactly one observes the majority transition;
/// the other finds the case already decided.
///
/// The deadline is also checked here, lazily: a vote arriving after
/// `auto_expire_at` finalizes the timeout decision instead of counting.
pub async fn cast_vote(
    case_id: CaseId,
    voter_id: MemberId,
    choice: VoteChoice,
    reasoning: &str,
    now: DateTime<Utc>,
    deps: &ServerDeps,
) -> Result<CastVoteResult, VoteError> {
    let reasoning = reasoning.trim();
    if reasoning.is_empty() {
        return Err(VoteError::EmptyReasoning);
    }

    let mut tx = deps.db_pool.begin().await.map_err(VoteError::Database)?;

    let case = ReviewCase::lock_by_id(case_id, &mut *tx)
        .await?
        .ok_or(VoteError::CaseNotFound(case_id))?;

    match CaseStatus::parse(&case.status) {
        Some(CaseStatus::Pending) => {}
        // Quorum already spoke. Record the straggler's vote for the trail —
        // accepted, not rejected — but freeze the decision-time tally.
        Some(CaseStatus::Approved) | Some(CaseStatus::Rejected) => {
            if !case.is_committee_member(voter_id) {
                return Err(VoteError::VoterNotOnCommittee);
            }
            let vote = Vote::insert(case.id, voter_id, choice, reasoning, &mut *tx).await?;
            tx.commit().await.map_err(VoteError::Database)?;
            info!(case_id = %case.id, voter_id = %voter_id, "Late vote recorded on decided case");
            return Ok(CastVoteResult {
                case,
                vote,
                outcome: VoteOutcome::AlreadyDecided,
            });
        }
        _ => {
            return Err(VoteError::CaseAlreadyDecided {
                status: case.status.clone(),
            });
        }
    }

    if case.auto_expire_at <= now {
        // Deadline passed without quorum: the fallback decision, not this
        // vote, resolves the case.
        let (case, member) = finalize_case(&case, CaseStatus::AutoExpired, now, &mut *tx).await?;
        tx.commit().await.map_err(VoteError::Database)?;
        dispatch_decision_effects(&case, &member, deps).await;
        return Err(VoteError::CaseAlreadyDecided {
            status: case.status,
        });
    }

    if !case.is_committee_member(voter_id) {
        return Err(VoteError::VoterNotOnCommittee);
    }

    let vote = Vote::insert(case.id, voter_id, choice, reasoning, &mut *tx).await?;
    let case = ReviewCase::add_to_tally(case.id, choice, &mut *tx).await?;

    // A majority only fires when this vote newly completes it. An extend
    // majority that was already applied on a loop-back leaves its 2 votes in
    // the tally; without this guard every later vote would re-trigger it.
    let rules = expulsion_rules();
    let tally = case.tally();
    let decision = rules
        .decide(&tally.counts())
        .filter(|decided| *decided == choice && tally.count(choice) == rules.majority);

    let (case, member, outcome) = match decision {
        None => {
            tx.commit().await.map_err(VoteError::Database)?;
            info!(
                case_id = %case.id,
                voter_id = %voter_id,
                choice = choice.as_str(),
                "Vote recorded, no quorum yet"
            );
            return Ok(CastVoteResult {
                case,
                vote,
                outcome: VoteOutcome::Pending,
            });
        }
        Some(VoteChoice::Expel) => {
            let (case, member) =
                finalize_case(&case, CaseStatus::Approved, now, &mut *tx).await?;
            (case, Some(member), VoteOutcome::Expelled)
        }
        Some(VoteChoice::Absolve) => {
            let case = ReviewCase::mark_decided(case.id, CaseStatus::Rejected, now, &mut *tx).await?;
            let member = Member::absolve(case.member_id, &mut *tx).await?;
            (case, member, VoteOutcome::Absolved)
        }
        Some(VoteChoice::Extend) => {
            // Not terminal: loop back to pending with the deadline pushed.
            let case = ReviewCase::extend_deadline(
                case.id,
                case.auto_expire_at + Duration::days(EXTENSION_DAYS),
                &mut *tx,
            )
            .await?;
            (case, None, VoteOutcome::Extended)
        }
    };

    tx.commit().await.map_err(VoteError::Database)?;

    info!(
        case_id = %case.id,
        voter_id = %voter_id,
        choice = choice.as_str(),
        outcome = ?outcome,
        "Vote reached quorum"
    );

    match (&outcome, &member) {
        (VoteOutcome::Extended, _) => {
            if let Ok(member) = Member::find_by_id(case.member_id, &deps.db_pool).await {
                notify_member(
                    deps,
                    &member,
                    "Review extended",
                    "The council extended your review period.",
                    serde_json::json!({ "kind": "case_extended", "case_id": case.id }),
                )
                .await;
            }
        }
        (_, Some(member)) => dispatch_decision_effects(&case, member, deps).await,
        _ => {}
    }

    Ok(CastVoteResult {
        case,
        vote,
        outcome,
    })
}

// ============================================================================
// Entry Point: Timeout sweep
// ============================================================================

/// Apply the fallback decision to every pending case past its deadline.
///
/// Each case gets its own transaction with a locked re-check, so the sweep
/// can race votes (or another sweep) and still decide each case exactly once.
/// Returns the number of cases expired.
pub async fn sweep_expired_cases(now: DateTime<Utc>, deps: &ServerDeps) -> Result<usize> {
    let expired_ids = ReviewCase::find_expired_ids(now, &deps.db_pool).await?;
    let mut expired = 0;

    for case_id in expired_ids {
        let mut tx = deps.db_pool.begin().await?;

        let case = match ReviewCase::lock_by_id(case_id, &mut *tx).await? {
            Some(case) => case,
            None => continue,
        };
        // Re-check under the lock: a concurrent vote may have decided the
        // case, or an extension may have pushed the deadline out.
        if !case.is_pending() || case.auto_expire_at > now {
            tx.rollback().await?;
            continue;
        }

        let (case, member) = finalize_case(&case, CaseStatus::AutoExpired, now, &mut *tx).await?;
        tx.commit().await?;
        expired += 1;

        info!(
            case_id = %case.id,
            member_id = %member.id,
            "Case auto-expired without quorum"
        );

        dispatch_decision_effects(&case, &member, deps).await;
    }

    Ok(expired)
}

// ============================================================================
// Queries
// ============================================================================

/// Load a case with its vote history (committee/admin UI read side).
pub async fn get_case(
    case_id: CaseId,
    deps: &ServerDeps,
) -> Result<Option<(ReviewCase, Vec<Vote>)>> {
    let case = match ReviewCase::find_by_id(case_id, &deps.db_pool).await? {
        Some(case) => case,
        None => return Ok(None),
    };
    let votes = Vote::find_by_case(case_id, &deps.db_pool).await?;
    Ok(Some((case, votes)))
}

// ============================================================================
// Internals
// ============================================================================

/// Terminal expulsion path shared by the expel quorum and the timeout: mark
/// the case, finalize the member's expulsion, and — on a second strike —
/// append the member's identifiers to the ban registry. All in the caller's
/// transaction.
async fn finalize_case(
    case: &ReviewCase,
    terminal: CaseStatus,
    now: DateTime<Utc>,
    tx: &mut sqlx::PgConnection,
) -> Result<(ReviewCase, Member), VoteError> {
    let case = ReviewCase::mark_decided(case.id, terminal, now, tx).await?;
    let member = Member::finalize_expulsion(case.member_id, now, tx).await?;

    if member.status == MemberStatus::Banned.as_str() {
        record_permanent_ban(&member, tx).await?;
        info!(
            member_id = %member.id,
            expulsion_count = member.expulsion_count,
            "Second expulsion finalized: member permanently banned"
        );
    }

    Ok((case, member))
}

/// Post-commit effects of an expulsion or absolution decision.
async fn dispatch_decision_effects(case: &ReviewCase, member: &Member, deps: &ServerDeps) {
    let (title, body) = match CaseStatus::parse(&case.status) {
        Some(CaseStatus::Rejected) => (
            "Review closed",
            "The council absolved your case. Your membership is active again.".to_string(),
        ),
        Some(CaseStatus::AutoExpired) => (
            "Membership expelled",
            "Your review period ended without a council decision; your membership has been revoked.".to_string(),
        ),
        _ => (
            "Membership expelled",
            "The council voted to revoke your membership.".to_string(),
        ),
    };

    notify_member(
        deps,
        member,
        title,
        &body,
        serde_json::json!({ "kind": "case_decided", "case_id": case.id, "status": case.status }),
    )
    .await;

    notify_committee(
        deps,
        &case.committee_snapshot,
        "Review case closed",
        &format!("Case resolved: {}.", case.status),
        serde_json::json!({ "kind": "case_decided", "case_id": case.id, "status": case.status }),
    )
    .await;

    // Misconduct cases that end in expulsion also instruct the ledger.
    let expelled = matches!(
        CaseStatus::parse(&case.status),
        Some(CaseStatus::Approved) | Some(CaseStatus::AutoExpired)
    );
    if expelled && case.trigger_type == TriggerType::Misconduct.as_str() {
        if let Some(ledger) = &deps.points_ledger {
            if let Err(e) = ledger
                .apply_penalty(
                    member.id,
                    MISCONDUCT_PENALTY_POINTS,
                    "misconduct case resolved: expulsion",
                )
                .await
            {
                warn!(member_id = %member.id, error = %e, "Ledger penalty dispatch failed (non-fatal)");
            }
        }
    }
}

/// Best-effort push to the affected member.
async fn notify_member(
    deps: &ServerDeps,
    member: &Member,
    title: &str,
    body: &str,
    data: serde_json::Value,
) {
    let Some(token) = &member.expo_push_token else {
        return;
    };
    if let Err(e) = deps
        .push_service
        .send_notification(token, title, body, data)
        .await
    {
        warn!(member_id = %member.id, error = %e, "Member notification failed (non-fatal)");
    }
}

/// Best-effort batch push to the case committee.
async fn notify_committee(
    deps: &ServerDeps,
    committee: &[MemberId],
    title: &str,
    body: &str,
    data: serde_json::Value,
) {
    let members = match Member::find_by_ids(committee, &deps.db_pool).await {
        Ok(members) => members,
        Err(e) => {
            warn!(error = %e, "Committee lookup for notification failed (non-fatal)");
            return;
        }
    };

    let notifications: Vec<_> = members
        .iter()
        .filter_map(|m| m.expo_push_token.as_deref())
        .map(|token| (token, title, body, data.clone()))
        .collect();

    if notifications.is_empty() {
        return;
    }
    if let Err(e) = deps.push_service.send_batch(notifications).await {
        warn!(error = %e, "Committee notification failed (non-fatal)");
    }
}
