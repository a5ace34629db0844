// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// The governance rules (ladder thresholds, quorum, eligibility) are domain
// functions that use these traits at the edges.
//
// Naming convention: Base* for trait names (e.g., BaseCommitteeRoster)

use anyhow::Result;
use async_trait::async_trait;

use crate::common::MemberId;

// =============================================================================
// Push Notification Trait (Infrastructure)
// =============================================================================

#[async_trait]
pub trait BasePushNotificationService: Send + Sync {
    /// Send a push notification to a push token
    async fn send_notification(
        &self,
        push_token: &str,
        title: &str,
        body: &str,
        data: serde_json::Value,
    ) -> Result<()>;

    /// Send multiple notifications in batch
    async fn send_batch(
        &self,
        notifications: Vec<(&str, &str, &str, serde_json::Value)>,
    ) -> Result<()>;
}

// =============================================================================
// Committee Roster Trait (Infrastructure - ranking provider boundary)
// =============================================================================

/// Supplies the current committee: the top-ranked members empowered to vote
/// on disciplinary cases. Read-only here; the ranking computation lives in
/// another subsystem. Case creation snapshots this roster, so a mid-case
/// ranking shift never changes who may vote on an open case.
#[async_trait]
pub trait BaseCommitteeRoster: Send + Sync {
    /// The committee member identities, best-ranked first.
    async fn current_committee(&self) -> Result<Vec<MemberId>>;
}

// =============================================================================
// Points Ledger Trait (Infrastructure - penalty instructions)
// =============================================================================

/// Receives point-deduction instructions when a misconduct case resolves
/// against the member. Inactivity-driven expulsion does not deduct points.
#[async_trait]
pub trait BasePointsLedger: Send + Sync {
    async fn apply_penalty(&self, member_id: MemberId, points: i32, reason: &str) -> Result<()>;
}
