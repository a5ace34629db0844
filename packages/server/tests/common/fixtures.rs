//! Test fixtures for creating governance test data.
//!
//! These fixtures use the model methods where possible and raw SQL where a
//! test needs to rewrite history (backdating join dates, seeding expulsion
//! counts) that no production path exposes.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use server_core::common::MemberId;
use server_core::domains::member::models::Member;

/// Create an active member with unique identifiers.
pub async fn create_active_member(pool: &PgPool, name: &str) -> Result<Member> {
    let tag = Uuid::new_v4();
    Member::create(
        name.to_string(),
        format!("{}-{}@example.com", name.to_lowercase().replace(' ', "."), tag),
        format!("+55119{}", &tag.simple().to_string()[..8]),
        format!("tax-{}", tag),
        Some(format!("ExponentPushToken[{}]", tag)),
        pool,
    )
    .await
}

/// Rewrite a member's clock: join date and last-given-referral date.
pub async fn backdate_member(
    pool: &PgPool,
    member_id: MemberId,
    joined_at: DateTime<Utc>,
    last_given_referral_at: DateTime<Utc>,
) -> Result<()> {
    sqlx::query("UPDATE members SET joined_at = $2, last_given_referral_at = $3 WHERE id = $1")
        .bind(member_id)
        .bind(joined_at)
        .bind(last_given_referral_at)
        .execute(pool)
        .await?;
    Ok(())
}

/// Seed expulsion history directly (count, timestamp, status).
pub async fn seed_expulsion_history(
    pool: &PgPool,
    member_id: MemberId,
    expulsion_count: i32,
    last_expulsion_at: Option<DateTime<Utc>>,
    status: &str,
) -> Result<()> {
    sqlx::query(
        "UPDATE members SET expulsion_count = $2, last_expulsion_at = $3, status = $4
         WHERE id = $1",
    )
    .bind(member_id)
    .bind(expulsion_count)
    .bind(last_expulsion_at)
    .bind(status)
    .execute(pool)
    .await?;
    Ok(())
}
