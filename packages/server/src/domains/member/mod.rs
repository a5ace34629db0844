// Member domain: the governed entity.
//
// This subsystem is the sole writer of members.status, warning_level,
// expulsion_count and last_expulsion_at; everything else reads.

pub mod actions;
pub mod models;
