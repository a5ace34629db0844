use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use crate::common::MemberId;

/// Member lifecycle status.
///
/// Stored as TEXT; the CHECK constraint on `members.status` mirrors this set.
/// `Banned` is terminal: no normal flow ever leaves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberStatus {
    Active,
    UnderReview,
    Expelled,
    Banned,
}

impl MemberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::UnderReview => "under_review",
            Self::Expelled => "expelled",
            Self::Banned => "banned",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "under_review" => Some(Self::UnderReview),
            "expelled" => Some(Self::Expelled),
            "banned" => Some(Self::Banned),
            _ => None,
        }
    }
}

/// Member model - SQL persistence layer
///
/// `last_given_referral_at` defaults to the join date, so a member who never
/// reciprocated is measured from when they joined. `warning_level` and
/// `expulsion_count` are monotonic; status mutations carry a WHERE guard so
/// a lost race degrades to a no-op rather than an illegal transition.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct Member {
    pub id: MemberId,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub tax_id: String,
    pub expo_push_token: Option<String>,
    pub status: String,
    pub warning_level: i32,
    pub last_given_referral_at: DateTime<Utc>,
    pub expulsion_count: i32,
    pub last_expulsion_at: Option<DateTime<Utc>>,
    pub joined_at: DateTime<Utc>,
}

impl Member {
    pub fn status(&self) -> Option<MemberStatus> {
        MemberStatus::parse(&self.status)
    }

    pub fn is_active(&self) -> bool {
        self.status == MemberStatus::Active.as_str()
    }

    /// Insert a new member. The referral clock starts at the join date.
    pub async fn create(
        full_name: String,
        email: String,
        phone: String,
        tax_id: String,
        expo_push_token: Option<String>,
        pool: &PgPool,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO members (
                id,
                full_name,
                email,
                phone,
                tax_id,
                expo_push_token,
                last_given_referral_at,
                joined_at
             )
             VALUES ($1, $2, $3, $4, $5, $6, now(), now())
             RETURNING *",
        )
        .bind(MemberId::new())
        .bind(full_name)
        .bind(email)
        .bind(phone)
        .bind(tax_id)
        .bind(expo_push_token)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// Find member by ID
    pub async fn find_by_id(id: MemberId, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>("SELECT * FROM members WHERE id = $1")
            .bind(id)
            .fetch_one(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn find_by_id_optional(id: MemberId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM members WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Find several members at once (committee notification fan-out).
    pub async fn find_by_ids(ids: &[MemberId], pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM members WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(pool)
            .await
            .map_err(Into::into)
    }

    /// All active members, oldest join first — the escalation batch input.
    pub async fn find_active(pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM members WHERE status = 'active' ORDER BY joined_at ASC",
        )
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Advance the referral clock. Called from the referral subsystem's
    /// boundary when the member gives a reciprocated referral; advancing
    /// the timestamp is what clears any in-flight escalation on the next
    /// batch run.
    pub async fn record_given_referral(
        id: MemberId,
        at: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "UPDATE members SET last_given_referral_at = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(at)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// Raise the warning level, monotonically. A concurrent batch that
    /// already raised it further wins; this never lowers the level.
    pub async fn raise_warning_level(
        id: MemberId,
        level: i32,
        conn: &mut PgConnection,
    ) -> Result<()> {
        sqlx::query("UPDATE members SET warning_level = GREATEST(warning_level, $2) WHERE id = $1")
            .bind(id)
            .bind(level)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// active → under_review, guarded. Returns None if the member was not
    /// active (already under review, or a race lost to another case opener).
    pub async fn set_under_review(id: MemberId, conn: &mut PgConnection) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "UPDATE members SET status = 'under_review'
             WHERE id = $1 AND status = 'active'
             RETURNING *",
        )
        .bind(id)
        .fetch_optional(conn)
        .await
        .map_err(Into::into)
    }

    /// under_review → active (case absolved). Warning history stays intact.
    pub async fn absolve(id: MemberId, conn: &mut PgConnection) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "UPDATE members SET status = 'active'
             WHERE id = $1 AND status = 'under_review'
             RETURNING *",
        )
        .bind(id)
        .fetch_optional(conn)
        .await
        .map_err(Into::into)
    }

    /// Finalize an expulsion: bump the count, stamp the time, and land on
    /// `expelled` — or `banned` when this is the second strike. The CASE
    /// expression makes the count check and the status write one atomic
    /// statement.
    pub async fn finalize_expulsion(
        id: MemberId,
        now: DateTime<Utc>,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "UPDATE members SET
                status = CASE WHEN expulsion_count + 1 >= 2 THEN 'banned' ELSE 'expelled' END,
                expulsion_count = expulsion_count + 1,
                last_expulsion_at = $2
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(now)
        .fetch_one(conn)
        .await
        .map_err(Into::into)
    }

    /// expelled → active (reentry approved). Expulsion history is kept so a
    /// future second expulsion is recognized as the second one.
    pub async fn reinstate(id: MemberId, conn: &mut PgConnection) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "UPDATE members SET status = 'active'
             WHERE id = $1 AND status = 'expelled'
             RETURNING *",
        )
        .bind(id)
        .fetch_optional(conn)
        .await
        .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for status in [
            MemberStatus::Active,
            MemberStatus::UnderReview,
            MemberStatus::Expelled,
            MemberStatus::Banned,
        ] {
            assert_eq!(MemberStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(MemberStatus::parse("suspended"), None);
    }

    #[test]
    fn test_member_struct() {
        let member = Member {
            id: MemberId::new(),
            full_name: "Ana Souza".to_string(),
            email: "ana@example.com".to_string(),
            phone: "+5511999990000".to_string(),
            tax_id: "123.456.789-00".to_string(),
            expo_push_token: Some("ExponentPushToken[xyz]".to_string()),
            status: "active".to_string(),
            warning_level: 0,
            last_given_referral_at: Utc::now(),
            expulsion_count: 0,
            last_expulsion_at: None,
            joined_at: Utc::now(),
        };

        assert!(member.is_active());
        assert_eq!(member.status(), Some(MemberStatus::Active));
    }
}
