//! Integration tests for the activity clock + escalation ladder.
//!
//! Covers the staged warning progression, skipped-run behavior, tenure
//! grace, idempotency under re-runs, and the level-4 handoff to the review
//! case engine.

mod common;

use chrono::{Duration, Utc};
use test_context::test_context;

use crate::common::{backdate_member, create_active_member, TestHarness};
use server_core::domains::discipline::actions::{
    evaluate_member, run_escalation_batch, EscalationOutcome,
};
use server_core::domains::discipline::errors::EscalationError;
use server_core::domains::discipline::models::InactivityWarning;
use server_core::domains::member::models::Member;
use server_core::domains::review::models::ReviewCase;

fn months_ago_approx(months: i64) -> chrono::DateTime<Utc> {
    // 31 days per month keeps every whole-month threshold safely crossed.
    Utc::now() - Duration::days(31 * months)
}

#[test_context(TestHarness)]
#[tokio::test]
async fn young_member_is_never_evaluated(ctx: &TestHarness) {
    let deps = ctx.deps_with_committee(vec![]);
    let member = create_active_member(&ctx.db_pool, "Young Member").await.unwrap();

    // One month of tenure, already "inactive" since joining.
    backdate_member(&ctx.db_pool, member.id, months_ago_approx(1), months_ago_approx(1))
        .await
        .unwrap();

    let member = Member::find_by_id(member.id, &ctx.db_pool).await.unwrap();
    let outcome = evaluate_member(&member, Utc::now(), &deps.deps).await.unwrap();

    assert!(matches!(outcome, EscalationOutcome::None));
    let warnings = InactivityWarning::find_by_member(member.id, &ctx.db_pool)
        .await
        .unwrap();
    assert!(warnings.is_empty());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn three_months_inactive_issues_first_warning_once(ctx: &TestHarness) {
    let deps = ctx.deps_with_committee(vec![]);
    let member = create_active_member(&ctx.db_pool, "Quiet Member").await.unwrap();
    backdate_member(&ctx.db_pool, member.id, months_ago_approx(3), months_ago_approx(3))
        .await
        .unwrap();

    let member = Member::find_by_id(member.id, &ctx.db_pool).await.unwrap();
    let outcome = evaluate_member(&member, Utc::now(), &deps.deps).await.unwrap();

    let warning = match outcome {
        EscalationOutcome::WarningIssued(w) => w,
        other => panic!("expected a warning, got {:?}", other),
    };
    assert_eq!(warning.level, 1);
    assert_eq!(warning.warning_type, "first_warning");
    assert_eq!(warning.months_inactive, 3);

    // Member state and notification follow the warning.
    let member = Member::find_by_id(member.id, &ctx.db_pool).await.unwrap();
    assert_eq!(member.warning_level, 1);
    let token = member.expo_push_token.as_deref().unwrap();
    assert!(deps.push.was_notified(token, "Inactivity warning"));

    // Re-running with unchanged inputs is a no-op: same warning, no new row.
    let outcome = evaluate_member(&member, Utc::now(), &deps.deps).await.unwrap();
    assert!(matches!(outcome, EscalationOutcome::None));
    let warnings = InactivityWarning::find_by_member(member.id, &ctx.db_pool)
        .await
        .unwrap();
    assert_eq!(warnings.len(), 1);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn skipped_batch_runs_issue_only_the_highest_stage(ctx: &TestHarness) {
    let deps = ctx.deps_with_committee(vec![]);
    let member = create_active_member(&ctx.db_pool, "Forgotten Member").await.unwrap();

    // The batch "was down" for months: 5 months inactive, nothing issued.
    backdate_member(&ctx.db_pool, member.id, months_ago_approx(5), months_ago_approx(5))
        .await
        .unwrap();

    let member = Member::find_by_id(member.id, &ctx.db_pool).await.unwrap();
    let outcome = evaluate_member(&member, Utc::now(), &deps.deps).await.unwrap();

    // Only the final warning lands; levels 1 and 2 are moot and never replayed.
    match outcome {
        EscalationOutcome::WarningIssued(w) => {
            assert_eq!(w.level, 3);
            assert_eq!(w.warning_type, "final_warning");
        }
        other => panic!("expected final warning, got {:?}", other),
    }
    let warnings = InactivityWarning::find_by_member(member.id, &ctx.db_pool)
        .await
        .unwrap();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].level, 3);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn ladder_progresses_strictly_level_by_level(ctx: &TestHarness) {
    let deps = ctx.deps_with_committee(vec![]);
    let member = create_active_member(&ctx.db_pool, "Ladder Member").await.unwrap();

    let t0 = Utc::now();
    backdate_member(&ctx.db_pool, member.id, t0, t0).await.unwrap();

    // Walk the batch forward one month at a time past each threshold.
    let mut issued = Vec::new();
    for months in [3i64, 4, 5] {
        let now = t0 + Duration::days(31 * months);
        let member = Member::find_by_id(member.id, &ctx.db_pool).await.unwrap();
        match evaluate_member(&member, now, &deps.deps).await.unwrap() {
            EscalationOutcome::WarningIssued(w) => issued.push(w.level),
            other => panic!("expected warning at {} months, got {:?}", months, other),
        }
    }

    // Strictly increasing, no skips, no repeats.
    assert_eq!(issued, vec![1, 2, 3]);

    let warnings = InactivityWarning::find_by_member(member.id, &ctx.db_pool)
        .await
        .unwrap();
    let levels: Vec<i32> = warnings.iter().map(|w| w.level).collect();
    assert_eq!(levels, vec![1, 2, 3]);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn six_months_opens_a_review_case_not_a_warning(ctx: &TestHarness) {
    let voter = create_active_member(&ctx.db_pool, "Voter One").await.unwrap();
    let deps = ctx.deps_with_committee(vec![voter.id]);

    let member = create_active_member(&ctx.db_pool, "Gone Member").await.unwrap();
    backdate_member(&ctx.db_pool, member.id, months_ago_approx(6), months_ago_approx(6))
        .await
        .unwrap();

    let member = Member::find_by_id(member.id, &ctx.db_pool).await.unwrap();
    let outcome = evaluate_member(&member, Utc::now(), &deps.deps).await.unwrap();

    let case = match outcome {
        EscalationOutcome::CaseOpened(case) => case,
        other => panic!("expected a case, got {:?}", other),
    };
    assert_eq!(case.trigger_type, "inactivity");
    assert_eq!(case.status, "pending");
    // Evidence snapshot captured at creation.
    assert_eq!(case.trigger_details["months_inactive"], 6);

    // The case is the level-4 artifact: no warning row is written for it.
    let warnings = InactivityWarning::find_by_member(member.id, &ctx.db_pool)
        .await
        .unwrap();
    assert!(warnings.iter().all(|w| w.level <= 3));

    // Member is now under review and off the ladder: evaluating them again
    // is an explicit precondition error, not a silent skip.
    let reloaded = Member::find_by_id(member.id, &ctx.db_pool).await.unwrap();
    assert_eq!(reloaded.status, "under_review");
    let err = evaluate_member(&reloaded, Utc::now(), &deps.deps)
        .await
        .unwrap_err();
    assert!(matches!(err, EscalationError::MemberNotActive { .. }));

    // A full batch run skips them and leaves the single pending case alone.
    run_escalation_batch(Utc::now(), &deps.deps).await.unwrap();
    let pending = ReviewCase::find_pending_by_member(member.id, &ctx.db_pool)
        .await
        .unwrap();
    assert_eq!(pending.unwrap().id, case.id);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn giving_a_referral_clears_the_escalation(ctx: &TestHarness) {
    let deps = ctx.deps_with_committee(vec![]);
    let member = create_active_member(&ctx.db_pool, "Revived Member").await.unwrap();

    // Long-tenured, long-inactive...
    backdate_member(&ctx.db_pool, member.id, months_ago_approx(8), months_ago_approx(4))
        .await
        .unwrap();

    // ...but a referral lands between batch runs.
    Member::record_given_referral(member.id, Utc::now(), &ctx.db_pool)
        .await
        .unwrap();

    let member = Member::find_by_id(member.id, &ctx.db_pool).await.unwrap();
    let outcome = evaluate_member(&member, Utc::now(), &deps.deps).await.unwrap();

    // The advanced referral clock clears everything; no explicit reset step.
    assert!(matches!(outcome, EscalationOutcome::None));
    let warnings = InactivityWarning::find_by_member(member.id, &ctx.db_pool)
        .await
        .unwrap();
    assert!(warnings.is_empty());
}
