//! Typed ID aliases for the governance entities.
//!
//! One marker type per entity, aliased through [`Id`] so the compiler keeps
//! member, case and vote identifiers from being mixed up.

pub use super::id::{Id, V4, V7};

// ============================================================================
// Entity marker types
// ============================================================================

/// Marker type for Member entities.
pub struct Member;

/// Marker type for ReviewCase entities (disciplinary cases under vote).
pub struct ReviewCase;

/// Marker type for Vote entities.
pub struct Vote;

/// Marker type for InactivityWarning entities.
pub struct InactivityWarning;

/// Marker type for ReentryRequest entities.
pub struct ReentryRequest;

/// Marker type for BanRegistry entries.
pub struct BanEntry;

// ============================================================================
// Type aliases - the primary API
// ============================================================================

/// Typed ID for Member entities.
pub type MemberId = Id<Member>;

/// Typed ID for ReviewCase entities.
pub type CaseId = Id<ReviewCase>;

/// Typed ID for Vote entities.
pub type VoteId = Id<Vote>;

/// Typed ID for InactivityWarning entities.
pub type WarningId = Id<InactivityWarning>;

/// Typed ID for ReentryRequest entities.
pub type ReentryRequestId = Id<ReentryRequest>;

/// Typed ID for BanRegistry entries.
pub type BanEntryId = Id<BanEntry>;
