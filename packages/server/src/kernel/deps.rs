//! Server dependencies for domain actions (using traits for testability)
//!
//! Central dependency container handed to every domain action. All external
//! services sit behind trait abstractions so tests can inject mocks.

use sqlx::PgPool;
use std::sync::Arc;

use crate::kernel::{BaseCommitteeRoster, BasePointsLedger, BasePushNotificationService};

/// Server dependencies accessible to domain actions
#[derive(Clone)]
pub struct ServerDeps {
    pub db_pool: PgPool,
    pub push_service: Arc<dyn BasePushNotificationService>,
    /// Committee identities from the external ranking provider (read-only).
    pub committee_roster: Arc<dyn BaseCommitteeRoster>,
    /// Points ledger for misconduct penalties (optional — not all envs run one).
    pub points_ledger: Option<Arc<dyn BasePointsLedger>>,
}

impl ServerDeps {
    /// Create new ServerDeps with the given dependencies
    pub fn new(
        db_pool: PgPool,
        push_service: Arc<dyn BasePushNotificationService>,
        committee_roster: Arc<dyn BaseCommitteeRoster>,
        points_ledger: Option<Arc<dyn BasePointsLedger>>,
    ) -> Self {
        Self {
            db_pool,
            push_service,
            committee_roster,
            points_ledger,
        }
    }
}
