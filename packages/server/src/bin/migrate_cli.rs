//! CLI for applying and inspecting schema migrations
//!
//! Deploy tooling calls this instead of booting the full server.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sqlx::migrate::Migrator;
use sqlx::PgPool;

use server_core::Config;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

#[derive(Parser)]
#[command(name = "migrate_cli")]
#[command(about = "Schema migration CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply all pending migrations
    Run,

    /// List known migrations
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run => {
            let config = Config::from_env().context("Failed to load configuration")?;
            let pool = PgPool::connect(&config.database_url)
                .await
                .context("Failed to connect to database")?;

            MIGRATOR
                .run(&pool)
                .await
                .context("Failed to run migrations")?;

            println!("Migrations applied");
        }
        Commands::List => {
            for migration in MIGRATOR.iter() {
                println!("{:>14}  {}", migration.version, migration.description);
            }
        }
    }

    Ok(())
}
