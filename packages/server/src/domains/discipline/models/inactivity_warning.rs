use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::common::{MemberId, WarningId};

/// InactivityWarning model - SQL persistence layer
///
/// Append-only. A given (member_id, level) pair exists at most once; the
/// unique constraint makes `record` idempotent under batch retries.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct InactivityWarning {
    pub id: WarningId,
    pub member_id: MemberId,
    pub level: i32,
    pub warning_type: String,
    pub message: String,
    pub months_inactive: i32,
    pub created_at: DateTime<Utc>,
}

impl InactivityWarning {
    /// Record a warning. Returns None when this (member, level) warning
    /// already exists — an idempotency collision, not an error.
    pub async fn record(
        member_id: MemberId,
        level: i32,
        warning_type: &str,
        message: &str,
        months_inactive: i32,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO inactivity_warnings (
                id, member_id, level, warning_type, message, months_inactive
             )
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (member_id, level) DO NOTHING
             RETURNING *",
        )
        .bind(WarningId::new())
        .bind(member_id)
        .bind(level)
        .bind(warning_type)
        .bind(message)
        .bind(months_inactive)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// All warnings for a member, lowest level first.
    pub async fn find_by_member(member_id: MemberId, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM inactivity_warnings WHERE member_id = $1 ORDER BY level ASC",
        )
        .bind(member_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Highest warning level ever issued to a member (0 if none).
    pub async fn highest_level_for(member_id: MemberId, pool: &PgPool) -> Result<i32> {
        let level: Option<i32> = sqlx::query_scalar(
            "SELECT MAX(level) FROM inactivity_warnings WHERE member_id = $1",
        )
        .bind(member_id)
        .fetch_one(pool)
        .await?;

        Ok(level.unwrap_or(0))
    }
}
