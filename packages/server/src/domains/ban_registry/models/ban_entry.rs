use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use crate::common::{BanEntryId, MemberId};

/// Kind of identifier held in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierType {
    Email,
    Phone,
    TaxId,
}

impl IdentifierType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Phone => "phone",
            Self::TaxId => "tax_id",
        }
    }
}

/// BanRegistry entry - SQL persistence layer
///
/// Append-only: entries are never deleted through normal flows, and the
/// unique (type, value) constraint makes re-banning a no-op.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct BanEntry {
    pub id: BanEntryId,
    pub identifier_type: String,
    pub identifier_value: String,
    pub member_id: MemberId,
    pub banned_at: DateTime<Utc>,
}

impl BanEntry {
    /// Append one identifier. Idempotent: an identifier already in the
    /// registry stays with its original banned_at.
    pub async fn append(
        identifier_type: IdentifierType,
        identifier_value: &str,
        member_id: MemberId,
        conn: &mut PgConnection,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO ban_registry (id, identifier_type, identifier_value, member_id)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (identifier_type, identifier_value) DO NOTHING",
        )
        .bind(BanEntryId::new())
        .bind(identifier_type.as_str())
        .bind(identifier_value)
        .bind(member_id)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// First registry entry matching any of the given identifiers.
    pub async fn find_hit(
        email: Option<&str>,
        phone: Option<&str>,
        tax_id: Option<&str>,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM ban_registry
             WHERE (identifier_type = 'email' AND identifier_value = $1)
                OR (identifier_type = 'phone' AND identifier_value = $2)
                OR (identifier_type = 'tax_id' AND identifier_value = $3)
             LIMIT 1",
        )
        .bind(email)
        .bind(phone)
        .bind(tax_id)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// All entries recorded for a member (test/audit read).
    pub async fn find_by_member(member_id: MemberId, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM ban_registry WHERE member_id = $1 ORDER BY identifier_type ASC",
        )
        .bind(member_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}
