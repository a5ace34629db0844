//! Integration tests for the review case engine + quorum voter.
//!
//! Covers first-to-majority resolution, vote preconditions, the extension
//! loop-back, timeout auto-expiry (sweep and lazy), concurrency, and the
//! second-expulsion ban handoff.

mod common;

use chrono::{Duration, Utc};
use test_context::test_context;

use crate::common::{create_active_member, seed_expulsion_history, TestHarness, TestDeps};
use server_core::domains::ban_registry::models::BanEntry;
use server_core::domains::member::models::Member;
use server_core::domains::review::actions::{
    cast_vote, open_inactivity_case, open_misconduct_case, sweep_expired_cases, VoteOutcome,
    AUTO_EXPIRE_DAYS, EXTENSION_DAYS, MISCONDUCT_PENALTY_POINTS,
};
use server_core::domains::review::errors::VoteError;
use server_core::domains::review::models::{ReviewCase, Vote};
use server_core::domains::review::quorum::VoteChoice;

/// Committee of three + a target member + an open inactivity case.
async fn setup_case(ctx: &TestHarness) -> (TestDeps, Vec<Member>, Member, ReviewCase) {
    let mut committee = Vec::new();
    for name in ["Committee A", "Committee B", "Committee C"] {
        committee.push(create_active_member(&ctx.db_pool, name).await.unwrap());
    }
    let deps = ctx.deps_with_committee(committee.iter().map(|m| m.id).collect());

    let member = create_active_member(&ctx.db_pool, "Accused Member").await.unwrap();
    let case = open_inactivity_case(&member, 6, Utc::now(), &deps.deps)
        .await
        .unwrap()
        .expect("case should open");

    (deps, committee, member, case)
}

#[test_context(TestHarness)]
#[tokio::test]
async fn expel_absolve_expel_resolves_on_second_expel_vote(ctx: &TestHarness) {
    let (deps, committee, member, case) = setup_case(ctx).await;

    let r1 = cast_vote(case.id, committee[0].id, VoteChoice::Expel, "inactive too long", Utc::now(), &deps.deps)
        .await
        .unwrap();
    assert_eq!(r1.outcome, VoteOutcome::Pending);

    let r2 = cast_vote(case.id, committee[1].id, VoteChoice::Absolve, "deserves another chance", Utc::now(), &deps.deps)
        .await
        .unwrap();
    assert_eq!(r2.outcome, VoteOutcome::Pending);

    // Second expel vote reaches the majority of 2: decided immediately.
    let r3 = cast_vote(case.id, committee[2].id, VoteChoice::Expel, "rules are rules", Utc::now(), &deps.deps)
        .await
        .unwrap();
    assert_eq!(r3.outcome, VoteOutcome::Expelled);
    assert_eq!(r3.case.status, "approved");
    assert!(r3.case.decided_at.is_some());

    let member = Member::find_by_id(member.id, &ctx.db_pool).await.unwrap();
    assert_eq!(member.status, "expelled");
    assert_eq!(member.expulsion_count, 1);
    assert!(member.last_expulsion_at.is_some());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn third_vote_after_decision_is_recorded_without_effect(ctx: &TestHarness) {
    let (deps, committee, _member, case) = setup_case(ctx).await;

    cast_vote(case.id, committee[0].id, VoteChoice::Expel, "no referrals given", Utc::now(), &deps.deps)
        .await
        .unwrap();
    let decided = cast_vote(case.id, committee[1].id, VoteChoice::Expel, "agreed", Utc::now(), &deps.deps)
        .await
        .unwrap();
    assert_eq!(decided.outcome, VoteOutcome::Expelled);

    // The straggler's vote is accepted for the trail, not rejected...
    let late = cast_vote(case.id, committee[2].id, VoteChoice::Absolve, "for the record", Utc::now(), &deps.deps)
        .await
        .unwrap();
    assert_eq!(late.outcome, VoteOutcome::AlreadyDecided);

    // ...but changes nothing: status and decision-time tally are frozen.
    let case = ReviewCase::find_by_id(case.id, &ctx.db_pool).await.unwrap().unwrap();
    assert_eq!(case.status, "approved");
    assert_eq!(case.votes_for_expulsion, 2);
    assert_eq!(case.votes_against, 0);

    let votes = Vote::find_by_case(case.id, &ctx.db_pool).await.unwrap();
    assert_eq!(votes.len(), 3);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn voting_twice_on_the_same_case_fails(ctx: &TestHarness) {
    let (deps, committee, _member, case) = setup_case(ctx).await;

    cast_vote(case.id, committee[0].id, VoteChoice::Expel, "first take", Utc::now(), &deps.deps)
        .await
        .unwrap();

    // Same voter again — fails, does not overwrite.
    let err = cast_vote(case.id, committee[0].id, VoteChoice::Absolve, "changed my mind", Utc::now(), &deps.deps)
        .await
        .unwrap_err();
    assert!(matches!(err, VoteError::AlreadyVoted));

    let case = ReviewCase::find_by_id(case.id, &ctx.db_pool).await.unwrap().unwrap();
    assert_eq!(case.votes_for_expulsion, 1);
    assert_eq!(case.votes_against, 0);
    let votes = Vote::find_by_case(case.id, &ctx.db_pool).await.unwrap();
    assert_eq!(votes.len(), 1);
    assert_eq!(votes[0].choice, "expel");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn empty_reasoning_is_rejected(ctx: &TestHarness) {
    let (deps, committee, _member, case) = setup_case(ctx).await;

    for reasoning in ["", "   "] {
        let err = cast_vote(case.id, committee[0].id, VoteChoice::Expel, reasoning, Utc::now(), &deps.deps)
            .await
            .unwrap_err();
        assert!(matches!(err, VoteError::EmptyReasoning));
    }

    let votes = Vote::find_by_case(case.id, &ctx.db_pool).await.unwrap();
    assert!(votes.is_empty());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn non_committee_voter_is_rejected(ctx: &TestHarness) {
    let (deps, _committee, _member, case) = setup_case(ctx).await;
    let outsider = create_active_member(&ctx.db_pool, "Outsider").await.unwrap();

    let err = cast_vote(case.id, outsider.id, VoteChoice::Expel, "let me in", Utc::now(), &deps.deps)
        .await
        .unwrap_err();
    assert!(matches!(err, VoteError::VoterNotOnCommittee));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn committee_is_snapshotted_at_case_creation(ctx: &TestHarness) {
    let (deps, committee, _member, case) = setup_case(ctx).await;

    // Rankings shift mid-case: a new top-3 replaces the old roster.
    let newcomer = create_active_member(&ctx.db_pool, "Newcomer").await.unwrap();
    deps.roster.replace(vec![newcomer.id]);

    // The snapshot, not the live roster, governs eligibility both ways.
    let err = cast_vote(case.id, newcomer.id, VoteChoice::Expel, "fresh eyes", Utc::now(), &deps.deps)
        .await
        .unwrap_err();
    assert!(matches!(err, VoteError::VoterNotOnCommittee));

    let ok = cast_vote(case.id, committee[0].id, VoteChoice::Expel, "still seated here", Utc::now(), &deps.deps)
        .await
        .unwrap();
    assert_eq!(ok.outcome, VoteOutcome::Pending);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn absolve_majority_reactivates_member_and_keeps_warnings(ctx: &TestHarness) {
    let (deps, committee, member, case) = setup_case(ctx).await;

    // A paper trail exists from the ladder.
    server_core::domains::discipline::models::InactivityWarning::record(
        member.id, 3, "final_warning", "final notice", 5, &ctx.db_pool,
    )
    .await
    .unwrap();

    cast_vote(case.id, committee[0].id, VoteChoice::Absolve, "showed good faith", Utc::now(), &deps.deps)
        .await
        .unwrap();
    let decided = cast_vote(case.id, committee[1].id, VoteChoice::Absolve, "agreed, absolve", Utc::now(), &deps.deps)
        .await
        .unwrap();
    assert_eq!(decided.outcome, VoteOutcome::Absolved);
    assert_eq!(decided.case.status, "rejected");

    let member = Member::find_by_id(member.id, &ctx.db_pool).await.unwrap();
    assert_eq!(member.status, "active");
    assert_eq!(member.expulsion_count, 0);

    // Absolution does not erase the paper trail.
    let warnings =
        server_core::domains::discipline::models::InactivityWarning::find_by_member(
            member.id, &ctx.db_pool,
        )
        .await
        .unwrap();
    assert_eq!(warnings.len(), 1);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn extend_majority_pushes_deadline_and_keeps_case_open(ctx: &TestHarness) {
    let (deps, committee, member, case) = setup_case(ctx).await;
    let original_deadline = case.auto_expire_at;

    cast_vote(case.id, committee[0].id, VoteChoice::Extend, "wait for their reply", Utc::now(), &deps.deps)
        .await
        .unwrap();
    let extended = cast_vote(case.id, committee[1].id, VoteChoice::Extend, "more time", Utc::now(), &deps.deps)
        .await
        .unwrap();

    // Extension is a loop-back, not a terminal state.
    assert_eq!(extended.outcome, VoteOutcome::Extended);
    assert_eq!(extended.case.status, "pending");
    assert_eq!(extended.case.extension_count, 1);
    assert_eq!(
        extended.case.auto_expire_at,
        original_deadline + Duration::days(EXTENSION_DAYS)
    );
    assert!(extended.case.decided_at.is_none());

    let member_row = Member::find_by_id(member.id, &ctx.db_pool).await.unwrap();
    assert_eq!(member_row.status, "under_review");

    // The remaining voter can still vote; one expel vote is no majority,
    // and the already-applied extend majority does not fire again.
    let r3 = cast_vote(case.id, committee[2].id, VoteChoice::Expel, "past due", Utc::now(), &deps.deps)
        .await
        .unwrap();
    assert_eq!(r3.outcome, VoteOutcome::Pending);
    assert_eq!(r3.case.extension_count, 1);

    // The pushed deadline still governs: past it, the case auto-expires.
    let past_extension = Utc::now() + Duration::days(AUTO_EXPIRE_DAYS + EXTENSION_DAYS + 1);
    let expired = sweep_expired_cases(past_extension, &deps.deps).await.unwrap();
    assert_eq!(expired, 1);

    let case = ReviewCase::find_by_id(case.id, &ctx.db_pool).await.unwrap().unwrap();
    assert_eq!(case.status, "auto_expired");
    let member_row = Member::find_by_id(member.id, &ctx.db_pool).await.unwrap();
    assert_eq!(member_row.status, "expelled");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn sweep_expires_voteless_case_and_expels_member(ctx: &TestHarness) {
    let (deps, _committee, member, case) = setup_case(ctx).await;

    // Sweep a day early: nothing happens.
    let early = Utc::now() + Duration::days(AUTO_EXPIRE_DAYS - 1);
    assert_eq!(sweep_expired_cases(early, &deps.deps).await.unwrap(), 0);

    // A day past the window: the fallback decision lands without any vote.
    let late = Utc::now() + Duration::days(AUTO_EXPIRE_DAYS + 1);
    assert_eq!(sweep_expired_cases(late, &deps.deps).await.unwrap(), 1);

    let case = ReviewCase::find_by_id(case.id, &ctx.db_pool).await.unwrap().unwrap();
    assert_eq!(case.status, "auto_expired");
    assert!(case.decided_at.is_some());

    let member = Member::find_by_id(member.id, &ctx.db_pool).await.unwrap();
    assert_eq!(member.status, "expelled");
    assert_eq!(member.expulsion_count, 1);

    // The sweep is idempotent.
    assert_eq!(sweep_expired_cases(late, &deps.deps).await.unwrap(), 0);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn vote_after_deadline_finalizes_the_timeout_instead(ctx: &TestHarness) {
    let (deps, committee, member, case) = setup_case(ctx).await;

    let late = Utc::now() + Duration::days(AUTO_EXPIRE_DAYS + 1);
    let err = cast_vote(case.id, committee[0].id, VoteChoice::Absolve, "too late anyway", late, &deps.deps)
        .await
        .unwrap_err();

    match err {
        VoteError::CaseAlreadyDecided { status } => assert_eq!(status, "auto_expired"),
        other => panic!("expected CaseAlreadyDecided, got {:?}", other),
    }

    let member = Member::find_by_id(member.id, &ctx.db_pool).await.unwrap();
    assert_eq!(member.status, "expelled");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn at_most_one_pending_case_per_member(ctx: &TestHarness) {
    let (deps, _committee, member, _case) = setup_case(ctx).await;

    // A racing batch tries again: idempotency collision, no second case.
    let member_row = Member::find_by_id(member.id, &ctx.db_pool).await.unwrap();
    let second = open_inactivity_case(&member_row, 7, Utc::now(), &deps.deps)
        .await
        .unwrap();
    assert!(second.is_none());

    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM review_cases WHERE member_id = $1 AND status = 'pending'",
    )
    .bind(member.id)
    .fetch_one(&ctx.db_pool)
    .await
    .unwrap();
    assert_eq!(count, 1);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn concurrent_votes_decide_exactly_once(ctx: &TestHarness) {
    let (deps, committee, _member, case) = setup_case(ctx).await;

    // Two voters submit at nearly the same instant; the row lock serializes
    // them and exactly one observes the majority transition.
    let (a, b) = tokio::join!(
        cast_vote(case.id, committee[0].id, VoteChoice::Expel, "vote a", Utc::now(), &deps.deps),
        cast_vote(case.id, committee[1].id, VoteChoice::Expel, "vote b", Utc::now(), &deps.deps),
    );

    let outcomes = [a.unwrap().outcome, b.unwrap().outcome];
    let decided = outcomes.iter().filter(|o| **o == VoteOutcome::Expelled).count();
    let pending = outcomes.iter().filter(|o| **o == VoteOutcome::Pending).count();
    assert_eq!(decided, 1);
    assert_eq!(pending, 1);

    let case = ReviewCase::find_by_id(case.id, &ctx.db_pool).await.unwrap().unwrap();
    assert_eq!(case.status, "approved");
    assert_eq!(case.votes_for_expulsion, 2);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn notification_failure_does_not_block_the_decision(ctx: &TestHarness) {
    let mut committee = Vec::new();
    for name in ["Mute A", "Mute B", "Mute C"] {
        committee.push(create_active_member(&ctx.db_pool, name).await.unwrap());
    }
    let deps = ctx.deps_with_failing_push(committee.iter().map(|m| m.id).collect());

    let member = create_active_member(&ctx.db_pool, "Unreachable Member").await.unwrap();
    let case = open_inactivity_case(&member, 6, Utc::now(), &deps.deps)
        .await
        .unwrap()
        .unwrap();

    cast_vote(case.id, committee[0].id, VoteChoice::Expel, "push is down", Utc::now(), &deps.deps)
        .await
        .unwrap();
    let decided = cast_vote(case.id, committee[1].id, VoteChoice::Expel, "still works", Utc::now(), &deps.deps)
        .await
        .unwrap();

    // The authoritative transition committed despite every push failing.
    assert_eq!(decided.outcome, VoteOutcome::Expelled);
    let member = Member::find_by_id(member.id, &ctx.db_pool).await.unwrap();
    assert_eq!(member.status, "expelled");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn misconduct_expulsion_instructs_the_ledger(ctx: &TestHarness) {
    let mut committee = Vec::new();
    for name in ["Judge A", "Judge B", "Judge C"] {
        committee.push(create_active_member(&ctx.db_pool, name).await.unwrap());
    }
    let deps = ctx.deps_with_committee(committee.iter().map(|m| m.id).collect());

    let member = create_active_member(&ctx.db_pool, "Reported Member").await.unwrap();
    let case = open_misconduct_case(
        &member,
        serde_json::json!({ "report_id": "r-123", "summary": "ghosted three referrals" }),
        Utc::now(),
        &deps.deps,
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(case.trigger_type, "misconduct");

    cast_vote(case.id, committee[0].id, VoteChoice::Expel, "pattern of abuse", Utc::now(), &deps.deps)
        .await
        .unwrap();
    cast_vote(case.id, committee[1].id, VoteChoice::Expel, "confirmed", Utc::now(), &deps.deps)
        .await
        .unwrap();

    let penalties = deps.ledger.penalties();
    assert_eq!(penalties.len(), 1);
    assert_eq!(penalties[0].member_id, member.id);
    assert_eq!(penalties[0].points, MISCONDUCT_PENALTY_POINTS);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn inactivity_expulsion_does_not_touch_the_ledger(ctx: &TestHarness) {
    let (deps, committee, _member, case) = setup_case(ctx).await;

    cast_vote(case.id, committee[0].id, VoteChoice::Expel, "inactive", Utc::now(), &deps.deps)
        .await
        .unwrap();
    cast_vote(case.id, committee[1].id, VoteChoice::Expel, "inactive", Utc::now(), &deps.deps)
        .await
        .unwrap();

    assert!(deps.ledger.penalties().is_empty());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn second_expulsion_bans_and_fills_the_registry(ctx: &TestHarness) {
    let mut committee = Vec::new();
    for name in ["Final A", "Final B", "Final C"] {
        committee.push(create_active_member(&ctx.db_pool, name).await.unwrap());
    }
    let deps = ctx.deps_with_committee(committee.iter().map(|m| m.id).collect());

    // Once-expelled, since readmitted, now active again.
    let member = create_active_member(&ctx.db_pool, "Repeat Offender").await.unwrap();
    seed_expulsion_history(
        &ctx.db_pool,
        member.id,
        1,
        Some(Utc::now() - Duration::days(365)),
        "active",
    )
    .await
    .unwrap();

    let member = Member::find_by_id(member.id, &ctx.db_pool).await.unwrap();
    let case = open_inactivity_case(&member, 6, Utc::now(), &deps.deps)
        .await
        .unwrap()
        .unwrap();

    cast_vote(case.id, committee[0].id, VoteChoice::Expel, "second strike", Utc::now(), &deps.deps)
        .await
        .unwrap();
    cast_vote(case.id, committee[1].id, VoteChoice::Expel, "out for good", Utc::now(), &deps.deps)
        .await
        .unwrap();

    // Terminal: banned, and every identifier lands in the registry.
    let banned = Member::find_by_id(member.id, &ctx.db_pool).await.unwrap();
    assert_eq!(banned.status, "banned");
    assert_eq!(banned.expulsion_count, 2);

    let entries = BanEntry::find_by_member(member.id, &ctx.db_pool).await.unwrap();
    let mut kinds: Vec<&str> = entries.iter().map(|e| e.identifier_type.as_str()).collect();
    kinds.sort();
    assert_eq!(kinds, vec!["email", "phone", "tax_id"]);
}
