use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use crate::common::{CaseId, MemberId};
use crate::domains::review::quorum::{Tally, VoteChoice};

/// What opened the case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerType {
    Inactivity,
    Misconduct,
    Other,
}

impl TriggerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inactivity => "inactivity",
            Self::Misconduct => "misconduct",
            Self::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "inactivity" => Some(Self::Inactivity),
            "misconduct" => Some(Self::Misconduct),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

/// Case lifecycle status.
///
/// Only `pending` accepts votes. `extended` never persists at rest: an
/// extend majority loops the case back to `pending` with the deadline pushed
/// forward, in the same transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseStatus {
    Pending,
    /// Quorum voted to expel.
    Approved,
    /// Quorum voted to absolve.
    Rejected,
    Extended,
    /// Deadline passed with no quorum; same side effects as Approved.
    AutoExpired,
}

impl CaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Extended => "extended",
            Self::AutoExpired => "auto_expired",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "extended" => Some(Self::Extended),
            "auto_expired" => Some(Self::AutoExpired),
            _ => None,
        }
    }
}

/// ReviewCase model - SQL persistence layer
///
/// `trigger_details` is an evidence snapshot captured at creation, so later
/// member activity cannot retroactively change what the committee judges.
/// `committee_snapshot` freezes who may vote; ranking shifts mid-case change
/// neither eligibility nor the validity of votes already cast.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct ReviewCase {
    pub id: CaseId,
    pub member_id: MemberId,
    pub trigger_type: String,
    pub trigger_details: serde_json::Value,
    pub status: String,
    pub committee_snapshot: Vec<MemberId>,
    pub votes_for_expulsion: i32,
    pub votes_against: i32,
    pub votes_to_extend: i32,
    pub extension_count: i32,
    pub auto_expire_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ReviewCase {
    pub fn is_pending(&self) -> bool {
        self.status == CaseStatus::Pending.as_str()
    }

    pub fn tally(&self) -> Tally {
        Tally {
            for_expulsion: self.votes_for_expulsion,
            against: self.votes_against,
            to_extend: self.votes_to_extend,
        }
    }

    pub fn is_committee_member(&self, voter_id: MemberId) -> bool {
        self.committee_snapshot.contains(&voter_id)
    }

    /// Insert a pending case. Returns None when the member already has a
    /// pending case — the partial unique index makes the race a no-op.
    pub async fn create(
        member_id: MemberId,
        trigger_type: TriggerType,
        trigger_details: serde_json::Value,
        committee_snapshot: &[MemberId],
        auto_expire_at: DateTime<Utc>,
        conn: &mut PgConnection,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO review_cases (
                id, member_id, trigger_type, trigger_details,
                committee_snapshot, auto_expire_at
             )
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (member_id) WHERE status = 'pending' DO NOTHING
             RETURNING *",
        )
        .bind(CaseId::new())
        .bind(member_id)
        .bind(trigger_type.as_str())
        .bind(trigger_details)
        .bind(committee_snapshot)
        .bind(auto_expire_at)
        .fetch_optional(conn)
        .await
        .map_err(Into::into)
    }

    pub async fn find_by_id(id: CaseId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM review_cases WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Load a case under a row lock for the duration of the transaction.
    pub async fn lock_by_id(id: CaseId, conn: &mut PgConnection) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM review_cases WHERE id = $1 FOR UPDATE")
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
            "SELECT * FROM review_cases WHERE member_id = $1 AND status = 'pending'",
        )
        .bind(member_id)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// IDs of pending cases whose deadline has passed — the sweep input.
    pub async fn find_expired_ids(now: DateTime<Utc>, pool: &PgPool) -> Result<Vec<CaseId>> {
        sqlx::query_scalar(
            "SELECT id FROM review_cases
             WHERE status = 'pending' AND auto_expire_at <= $1
             ORDER BY auto_expire_at ASC",
        )
        .bind(now)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Add one vote to the tally column for `choice` and return the fresh row.
    pub async fn add_to_tally(
        id: CaseId,
        choice: VoteChoice,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        let column = match choice {
            VoteChoice::Expel => "votes_for_expulsion",
            VoteChoice::Absolve => "votes_against",
            VoteChoice::Extend => "votes_to_extend",
        };
        let sql = format!(
            "UPDATE review_cases SET {column} = {column} + 1 WHERE id = $1 RETURNING *"
        );

        sqlx::query_as::<_, Self>(&sql)
            .bind(id)
            .fetch_one(conn)
            .await
            .map_err(Into::into)
    }

    /// Terminal transition: pending → approved / rejected / auto_expired.
    pub async fn mark_decided(
        id: CaseId,
        status: CaseStatus,
        decided_at: DateTime<Utc>,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "UPDATE review_cases SET status = $2, decided_at = $3
             WHERE id = $1 AND status = 'pending'
             RETURNING *",
        )
        .bind(id)
        .bind(status.as_str())
        .bind(decided_at)
        .fetch_one(conn)
        .await
        .map_err(Into::into)
    }

    /// Extension loop-back: the case stays pending with the deadline pushed
    /// forward one extension period.
    pub async fn extend_deadline(
        id: CaseId,
        new_deadline: DateTime<Utc>,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "UPDATE review_cases
             SET auto_expire_at = $2, extension_count = extension_count + 1
             WHERE id = $1 AND status = 'pending'
             RETURNING *",
        )
        .bind(id)
        .bind(new_deadline)
        .fetch_one(conn)
        .await
        .map_err(Into::into)
    }
}
