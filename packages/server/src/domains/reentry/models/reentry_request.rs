use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::common::{MemberId, ReentryRequestId};

/// Request lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// ReentryRequest model - SQL persistence layer
///
/// `reviewed_by` holds the deciding admin's identity; system auto-rejections
/// leave it NULL and explain themselves in `admin_notes`.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct ReentryRequest {
    pub id: ReentryRequestId,
    pub member_id: MemberId,
    pub status: String,
    pub reason: String,
    pub admin_notes: Option<String>,
    pub reviewed_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl ReentryRequest {
    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending.as_str()
    }

    /// Insert a pending request. None when the member already has one
    /// pending (partial unique index collision).
    pub async fn create_pending(
        member_id: MemberId,
        reason: &str,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO reentry_requests (id, member_id, reason)
             VALUES ($1, $2, $3)
             ON CONFLICT (member_id) WHERE status = 'pending' DO NOTHING
             RETURNING *",
        )
        .bind(ReentryRequestId::new())
        .bind(member_id)
        .bind(reason)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// Insert an already-rejected request: the system auto-reject path for
    /// cooldown and permanent-ban filings. Keeps the trail auditable without
    /// consuming admin attention.
    pub async fn create_auto_rejected(
        member_id: MemberId,
        reason: &str,
        admin_notes: &str,
        now: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO reentry_requests (id, member_id, status, reason, admin_notes, reviewed_at)
             VALUES ($1, $2, 'rejected', $3, $4, $5)
             RETURNING *",
        )
        .bind(ReentryRequestId::new())
        .bind(member_id)
        .bind(reason)
        .bind(admin_notes)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn find_by_id(id: ReentryRequestId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM reentry_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Load a request under a row lock for the duration of the transaction.
    pub async fn lock_by_id(
        id: ReentryRequestId,
        conn: &mut PgConnection,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM reentry_requests WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await
            .map_err(Into::into)
    }

    pub async fn find_pending_by_member(
        member_id: MemberId,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM reentry_requests WHERE member_id = $1 AND status = 'pending'",
        )
        .bind(member_id)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// pending → approved/rejected, guarded.
    pub async fn mark_reviewed(
        id: ReentryRequestId,
        status: RequestStatus,
        reviewed_by: Uuid,
        admin_notes: Option<&str>,
        now: DateTime<Utc>,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "UPDATE reentry_requests
             SET status = $2, reviewed_by = $3, admin_notes = $4, reviewed_at = $5
             WHERE id = $1 AND status = 'pending'
             RETURNING *",
        )
        .bind(id)
        .bind(status.as_str())
        .bind(reviewed_by)
        .bind(admin_notes)
        .bind(now)
        .fetch_one(conn)
        .await
        .map_err(Into::into)
    }
}
