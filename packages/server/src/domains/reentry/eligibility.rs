//! Reentry eligibility: pure classification over expulsion history.

use chrono::{DateTime, Months, Utc};

use crate::domains::discipline::activity::months_between;

/// Cooldown before a once-expelled member may request readmission.
pub const COOLDOWN_MONTHS: i32 = 6;

/// Where a member stands with respect to reentry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReentryEligibility {
    /// Second expulsion: permanently banned, regardless of elapsed time.
    Permanent,
    /// One expulsion, cooldown still running.
    Waiting { available_at: DateTime<Utc> },
    /// Reentry may be offered to an admin for approval.
    Eligible,
}

/// Classify a member's reentry standing.
///
/// The engine only gates whether the option is offered; approval itself is
/// always a human admin decision.
pub fn classify(
    expulsion_count: i32,
    last_expulsion_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> ReentryEligibility {
    if expulsion_count >= 2 {
        return ReentryEligibility::Permanent;
    }

    match (expulsion_count, last_expulsion_at) {
        (1, Some(expelled_at)) if months_between(expelled_at, now) < COOLDOWN_MONTHS => {
            ReentryEligibility::Waiting {
                available_at: expelled_at + Months::new(COOLDOWN_MONTHS as u32),
            }
        }
        _ => ReentryEligibility::Eligible,
    }
}
