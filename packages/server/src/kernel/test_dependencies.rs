// TestDependencies - mock implementations for testing
//
// Provides mock services that can be injected into ServerDeps for tests.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::common::MemberId;
use crate::kernel::{BaseCommitteeRoster, BasePointsLedger, BasePushNotificationService};

// =============================================================================
// Mock Push Notification Service
// =============================================================================

/// A notification captured by the mock push service
#[derive(Debug, Clone)]
pub struct SentNotification {
    pub push_token: String,
    pub title: String,
    pub body: String,
    pub data: serde_json::Value,
}

pub struct MockPushService {
    sent: Arc<Mutex<Vec<SentNotification>>>,
    fail: bool,
}

impl MockPushService {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            fail: false,
        }
    }

    /// A push service whose every delivery fails. Used to assert that
    /// notification failures never roll back governance state.
    pub fn failing() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            fail: true,
        }
    }

    /// All notifications delivered so far
    pub fn sent(&self) -> Vec<SentNotification> {
        self.sent.lock().unwrap().clone()
    }

    /// Check whether a notification with the given title reached a token
    pub fn was_notified(&self, push_token: &str, title: &str) -> bool {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .any(|n| n.push_token == push_token && n.title == title)
    }
}

impl Default for MockPushService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BasePushNotificationService for MockPushService {
    async fn send_notification(
        &self,
        push_token: &str,
        title: &str,
        body: &str,
        data: serde_json::Value,
    ) -> Result<()> {
        if self.fail {
            anyhow::bail!("mock push delivery failure");
        }
        self.sent.lock().unwrap().push(SentNotification {
            push_token: push_token.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            data,
        });
        Ok(())
    }

    async fn send_batch(
        &self,
        notifications: Vec<(&str, &str, &str, serde_json::Value)>,
    ) -> Result<()> {
        if self.fail {
            anyhow::bail!("mock push delivery failure");
        }
        let mut sent = self.sent.lock().unwrap();
        for (token, title, body, data) in notifications {
            sent.push(SentNotification {
                push_token: token.to_string(),
                title: title.to_string(),
                body: body.to_string(),
                data,
            });
        }
        Ok(())
    }
}

// =============================================================================
// Fixed Committee Roster
// =============================================================================

/// A committee roster with a fixed set of members, for tests.
pub struct FixedCommitteeRoster {
    members: Mutex<Vec<MemberId>>,
}

impl FixedCommitteeRoster {
    pub fn new(members: Vec<MemberId>) -> Self {
        Self {
            members: Mutex::new(members),
        }
    }

    /// Replace the roster, simulating a ranking shift mid-case.
    pub fn replace(&self, members: Vec<MemberId>) {
        *self.members.lock().unwrap() = members;
    }
}

#[async_trait]
impl BaseCommitteeRoster for FixedCommitteeRoster {
    async fn current_committee(&self) -> Result<Vec<MemberId>> {
        Ok(self.members.lock().unwrap().clone())
    }
}

// =============================================================================
// Mock Points Ledger
// =============================================================================

#[derive(Debug, Clone)]
pub struct RecordedPenalty {
    pub member_id: MemberId,
    pub points: i32,
    pub reason: String,
}

pub struct MockPointsLedger {
    penalties: Arc<Mutex<Vec<RecordedPenalty>>>,
}

impl MockPointsLedger {
    pub fn new() -> Self {
        Self {
            penalties: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn penalties(&self) -> Vec<RecordedPenalty> {
        self.penalties.lock().unwrap().clone()
    }
}

impl Default for MockPointsLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BasePointsLedger for MockPointsLedger {
    async fn apply_penalty(&self, member_id: MemberId, points: i32, reason: &str) -> Result<()> {
        self.penalties.lock().unwrap().push(RecordedPenalty {
            member_id,
            points,
            reason: reason.to_string(),
        });
        Ok(())
    }
}
