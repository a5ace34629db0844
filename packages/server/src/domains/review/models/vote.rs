use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use crate::common::{CaseId, MemberId, VoteId};
use crate::domains::review::errors::VoteError;
use crate::domains::review::quorum::{QuorumChoice, VoteChoice};

/// Vote model - SQL persistence layer
///
/// Immutable history: votes are never updated or deleted, and the
/// (case_id, voter_id) unique constraint means a second vote fails rather
/// than overwrites.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct Vote {
    pub id: VoteId,
    pub case_id: CaseId,
    pub voter_id: MemberId,
    pub choice: String,
    pub reasoning: String,
    pub created_at: DateTime<Utc>,
}

impl Vote {
    pub fn choice(&self) -> Option<VoteChoice> {
        VoteChoice::parse(&self.choice)
    }

    /// Insert a vote. A duplicate (case, voter) pair surfaces as
    /// [`VoteError::AlreadyVoted`] — the tally is untouched.
    pub async fn insert(
        case_id: CaseId,
        voter_id: MemberId,
        choice: VoteChoice,
        reasoning: &str,
        conn: &mut PgConnection,
    ) -> Result<Self, VoteError> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO votes (id, case_id, voter_id, choice, reasoning)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(VoteId::new())
        .bind(case_id)
        .bind(voter_id)
        .bind(choice.as_str())
        .bind(reasoning)
        .fetch_one(conn)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => VoteError::AlreadyVoted,
            _ => VoteError::from(e),
        })
    }

    /// All votes on a case, oldest first.
    pub async fn find_by_case(case_id: CaseId, pool: &PgPool) -> anyhow::Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM votes WHERE case_id = $1 ORDER BY created_at ASC",
        )
        .bind(case_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}
