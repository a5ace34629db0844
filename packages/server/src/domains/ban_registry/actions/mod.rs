//! Ban registry actions
//!
//! `record_permanent_ban` runs inside the expulsion transaction so the
//! blacklist and the terminal member status commit together.
//! `check_registration` is the registration flow's boundary query.

use anyhow::Result;
use serde::Serialize;
use sqlx::PgConnection;
use tracing::info;

use crate::domains::ban_registry::models::{BanEntry, IdentifierType};
use crate::domains::member::models::Member;
use crate::kernel::ServerDeps;

/// Copy a banned member's identifiers into the registry.
///
/// Called at the moment the second expulsion is finalized — not at
/// reentry-request time — inside the same transaction.
pub async fn record_permanent_ban(member: &Member, conn: &mut PgConnection) -> Result<()> {
    BanEntry::append(IdentifierType::Email, &member.email, member.id, conn).await?;
    BanEntry::append(IdentifierType::Phone, &member.phone, member.id, conn).await?;
    BanEntry::append(IdentifierType::TaxId, &member.tax_id, member.id, conn).await?;

    info!(member_id = %member.id, "Identifiers recorded in ban registry");
    Ok(())
}

/// Outcome of a registration-time registry check.
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationCheck {
    /// True when any identifier is blacklisted. The caller must treat this
    /// as a hard rejection, not a warning.
    pub banned: bool,
    pub matched_identifier: Option<String>,
}

/// Check prospective-signup identifiers against the registry.
pub async fn check_registration(
    email: Option<&str>,
    phone: Option<&str>,
    tax_id: Option<&str>,
    deps: &ServerDeps,
) -> Result<RegistrationCheck> {
    let hit = BanEntry::find_hit(email, phone, tax_id, &deps.db_pool).await?;

    Ok(match hit {
        Some(entry) => RegistrationCheck {
            banned: true,
            matched_identifier: Some(entry.identifier_type),
        },
        None => RegistrationCheck {
            banned: false,
            matched_identifier: None,
        },
    })
}
