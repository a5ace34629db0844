//! Activity clock: elapsed whole months of inactivity.
//!
//! Pure functions, no side effects. Month arithmetic is calendar-aware at
//! day resolution: a month has not elapsed until the same day-of-month is
//! reached (time of day is ignored — governance deadlines are day-grained).

use chrono::{DateTime, Datelike, Utc};

use crate::domains::member::models::Member;

/// Elapsed whole calendar months from `start` to `end`; 0 if `end <= start`.
pub fn months_between(start: DateTime<Utc>, end: DateTime<Utc>) -> i32 {
    if end <= start {
        return 0;
    }

    let mut months =
        (end.year() - start.year()) * 12 + (end.month() as i32 - start.month() as i32);
    if end.day() < start.day() {
        months -= 1;
    }
    months.max(0)
}

/// Whole months since the member last gave a referral.
///
/// The clock starts at `max(last_given_referral_at, joined_at)`: a referral
/// recorded before the join date (data import artifacts) never inflates the
/// inactivity count, and a member who never reciprocated is measured from
/// when they joined.
pub fn months_inactive(member: &Member, now: DateTime<Utc>) -> i32 {
    let start = member.last_given_referral_at.max(member.joined_at);
    months_between(start, now)
}

/// Whole months of membership tenure.
pub fn tenure_months(member: &Member, now: DateTime<Utc>) -> i32 {
    months_between(member.joined_at, now)
}
