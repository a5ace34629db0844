use thiserror::Error;

/// Escalation evaluation errors.
#[derive(Error, Debug)]
pub enum EscalationError {
    /// The ladder only evaluates active members; anything else is a caller
    /// mistake surfaced explicitly, never silently dropped.
    #[error("Member is not active: {status}")]
    MemberNotActive { status: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
