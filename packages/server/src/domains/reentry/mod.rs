// Reentry domain: how an expelled member may come back.
//
// The eligibility engine is a pure classification; the actions gate a
// human admin decision and enforce the terminal-ban invariant even when a
// caller bypasses the UI gate.

pub mod actions;
pub mod eligibility;
pub mod errors;
pub mod models;

pub use eligibility::ReentryEligibility;
pub use errors::ReentryError;
