use thiserror::Error;

use crate::common::CaseId;

/// Vote-submission errors surfaced to committee members.
///
/// Precondition violations are specific by design: the UI shows "already
/// voted" / "already decided", never a generic failure.
#[derive(Error, Debug)]
pub enum VoteError {
    #[error("Review case not found: {0}")]
    CaseNotFound(CaseId),

    #[error("Case already decided: {status}")]
    CaseAlreadyDecided { status: String },

    #[error("You have already voted on this case")]
    AlreadyVoted,

    #[error("Vote reasoning must not be empty")]
    EmptyReasoning,

    #[error("Voter is not on this case's committee")]
    VoterNotOnCommittee,

    #[error("Invalid vote choice: {0}")]
    InvalidChoice(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
