//! Escalation ladder: fixed inactivity thresholds and stage selection.
//!
//! Pure decision logic. Side effects (warning rows, case opening,
//! notifications) live in `actions`.

/// Members younger than this many whole months are never evaluated.
pub const TENURE_GRACE_MONTHS: i32 = 3;

/// Warning levels 1-3 issue a warning record; level 4 opens a review case
/// instead (the case itself is the level-4 artifact).
pub const COUNCIL_REVIEW_LEVEL: i32 = 4;

/// One rung of the escalation ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stage {
    pub level: i32,
    pub months: i32,
    pub warning_type: &'static str,
}

/// The fixed ladder, lowest rung first.
pub const STAGES: [Stage; 4] = [
    Stage {
        level: 1,
        months: 3,
        warning_type: "first_warning",
    },
    Stage {
        level: 2,
        months: 4,
        warning_type: "second_warning",
    },
    Stage {
        level: 3,
        months: 5,
        warning_type: "final_warning",
    },
    Stage {
        level: 4,
        months: 6,
        warning_type: "council_review",
    },
];

/// The stage to apply now: the highest rung whose threshold has been reached
/// and whose level is above everything already issued. None if the member is
/// current on the ladder.
///
/// Highest, not lowest, newly-applicable rung: a batch that skipped runs
/// (downtime) must not replay every missed warning — the lower ones are moot
/// once a higher threshold has been crossed.
pub fn applicable_stage(months_inactive: i32, highest_issued: i32) -> Option<Stage> {
    STAGES
        .iter()
        .rev()
        .find(|stage| stage.months <= months_inactive && stage.level > highest_issued)
        .copied()
}

/// Member-facing warning message for a ladder rung.
pub fn warning_message(stage: &Stage, months_inactive: i32) -> String {
    match stage.level {
        1 => format!(
            "You haven't given a referral in {} months. Members are expected to \
             reciprocate introductions — give a referral to stay in good standing.",
            months_inactive
        ),
        2 => format!(
            "Second notice: {} months without giving a referral. Please reciprocate \
             soon to avoid further action.",
            months_inactive
        ),
        _ => format!(
            "Final notice: {} months without giving a referral. One more month of \
             inactivity will refer your membership to the council for review.",
            months_inactive
        ),
    }
}
