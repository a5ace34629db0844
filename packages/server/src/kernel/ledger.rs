//! HTTP client for the points/penalty ledger.
//!
//! The ledger is an external collaborator: this client posts point-deduction
//! instructions and nothing else. Dispatch happens after the authoritative
//! state transition commits and is best-effort at the call sites.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{error, info};

use crate::common::MemberId;
use crate::kernel::traits::BasePointsLedger;

pub struct HttpLedgerClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct PenaltyInstruction<'a> {
    member_id: MemberId,
    points: i32,
    reason: &'a str,
}

impl HttpLedgerClient {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }
}

#[async_trait]
impl BasePointsLedger for HttpLedgerClient {
    async fn apply_penalty(&self, member_id: MemberId, points: i32, reason: &str) -> Result<()> {
        let url = format!("{}/penalties", self.base_url.trim_end_matches('/'));

        info!(member_id = %member_id, points, "Dispatching penalty instruction to ledger");

        let response = self
            .client
            .post(&url)
            .json(&PenaltyInstruction {
                member_id,
                points,
                reason,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Ledger penalty dispatch failed {}: {}", status, body);
            anyhow::bail!("Ledger API error {}: {}", status, body);
        }

        Ok(())
    }
}
