// Main entry point for the governance API server

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use server_core::common::utils::ExpoClient;
use server_core::kernel::{
    scheduled_tasks::start_scheduler, BasePointsLedger, HttpLedgerClient, PgCommitteeRoster,
    ServerDeps,
};
use server_core::server::build_app;
use server_core::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,server_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Cadena governance API");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    // Connect to database
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations complete");

    // Wire dependencies
    let deps = ServerDeps::new(
        pool.clone(),
        Arc::new(ExpoClient::new(config.expo_access_token.clone())),
        Arc::new(PgCommitteeRoster::new(pool.clone())),
        config
            .ledger_url
            .clone()
            .map(|url| Arc::new(HttpLedgerClient::new(url)) as Arc<dyn BasePointsLedger>),
    );

    // Start the daily governance batch (escalation pass + timeout sweep)
    let _scheduler = start_scheduler(deps.clone(), &config.governance_cron)
        .await
        .context("Failed to start scheduler")?;

    // Build application
    let app = build_app(deps);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
