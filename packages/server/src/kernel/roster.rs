//! Committee roster backed by the ranking provider's table.
//!
//! The external ranking subsystem maintains `committee_members`; this reader
//! only ever selects from it. Committee size is fixed at
//! [`crate::domains::review::quorum::COMMITTEE_SIZE`].

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;

use crate::common::MemberId;
use crate::domains::review::quorum::COMMITTEE_SIZE;
use crate::kernel::traits::BaseCommitteeRoster;

pub struct PgCommitteeRoster {
    pool: PgPool,
}

impl PgCommitteeRoster {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BaseCommitteeRoster for PgCommitteeRoster {
    async fn current_committee(&self) -> Result<Vec<MemberId>> {
        let ids: Vec<MemberId> = sqlx::query_scalar(
            "SELECT member_id FROM committee_members ORDER BY rank ASC LIMIT $1",
        )
        .bind(COMMITTEE_SIZE as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }
}
