use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub expo_access_token: Option<String>,
    /// Base URL of the points/penalty ledger service. Optional: environments
    /// without a ledger simply skip penalty dispatch.
    pub ledger_url: Option<String>,
    /// Cron expression for the daily governance batch (escalation + sweep).
    pub governance_cron: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            expo_access_token: env::var("EXPO_ACCESS_TOKEN").ok(),
            ledger_url: env::var("LEDGER_URL").ok(),
            governance_cron: env::var("GOVERNANCE_CRON")
                .unwrap_or_else(|_| "0 0 3 * * *".to_string()),
        })
    }
}
