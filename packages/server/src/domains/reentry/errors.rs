use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::common::{MemberId, ReentryRequestId};

/// Reentry flow errors.
///
/// `PermanentlyBanned` is the integrity-critical one: it fires at the engine
/// level even when an admin action bypasses the UI gate.
#[derive(Error, Debug)]
pub enum ReentryError {
    #[error("Member not found: {0}")]
    MemberNotFound(MemberId),

    #[error("Member is not expelled; reentry does not apply")]
    NotExpelled,

    #[error("Member is permanently banned; reentry can never be approved")]
    PermanentlyBanned,

    #[error("Reentry cooldown active until {available_at}")]
    CooldownActive { available_at: DateTime<Utc> },

    #[error("Reentry request not found: {0}")]
    RequestNotFound(ReentryRequestId),

    #[error("Reentry request already reviewed: {status}")]
    AlreadyReviewed { status: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
