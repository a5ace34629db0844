//! Test harness with testcontainers for integration testing.
//!
//! Uses a shared Postgres container across all tests for dramatically
//! improved performance. The container and migrations are initialized once
//! on first use, then reused; each test gets its own pool and its own
//! mock-backed ServerDeps.

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::PgPool;
use test_context::AsyncTestContext;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

use server_core::common::MemberId;
use server_core::kernel::test_dependencies::{
    FixedCommitteeRoster, MockPointsLedger, MockPushService,
};
use server_core::kernel::{BasePointsLedger, ServerDeps};

/// Shared test infrastructure that persists across all tests.
struct SharedTestInfra {
    db_url: String,
    // Keep the container alive for the entire test run
    _postgres: ContainerAsync<Postgres>,
}

/// Global shared infrastructure - initialized once, reused by all tests.
static SHARED_INFRA: OnceCell<SharedTestInfra> = OnceCell::const_new();

impl SharedTestInfra {
    async fn init() -> Result<Self> {
        // Respect RUST_LOG; try_init() avoids panicking if already set up.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let postgres = Postgres::default()
            .with_tag("16")
            .with_cmd(["-c", "max_connections=200"])
            .start()
            .await
            .context("Failed to start Postgres container")?;

        let pg_host = postgres.get_host().await?;
        let pg_port = postgres.get_host_port_ipv4(5432).await?;
        let db_url = format!(
            "postgresql://postgres:postgres@{}:{}/postgres",
            pg_host, pg_port
        );

        // Run migrations once on the shared database
        let pool = PgPool::connect(&db_url)
            .await
            .context("Failed to connect to Postgres for migrations")?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run migrations")?;

        Ok(Self {
            db_url,
            _postgres: postgres,
        })
    }

    async fn get() -> &'static Self {
        SHARED_INFRA
            .get_or_init(|| async {
                Self::init()
                    .await
                    .expect("Failed to initialize shared test infrastructure")
            })
            .await
    }
}

/// Test harness that manages test infrastructure.
pub struct TestHarness {
    /// Database pool - use this for test fixtures.
    pub db_pool: PgPool,
}

impl AsyncTestContext for TestHarness {
    async fn setup() -> Self {
        Self::new().await.expect("Failed to create test harness")
    }

    async fn teardown(self) {
        // Database pool is automatically dropped
    }
}

/// ServerDeps wired to mocks, with handles kept for assertions.
pub struct TestDeps {
    pub deps: ServerDeps,
    pub push: Arc<MockPushService>,
    pub ledger: Arc<MockPointsLedger>,
    pub roster: Arc<FixedCommitteeRoster>,
}

impl TestHarness {
    pub async fn new() -> Result<Self> {
        let infra = SharedTestInfra::get().await;

        let db_pool = PgPool::connect(&infra.db_url)
            .await
            .context("Failed to connect to test database")?;

        Ok(Self { db_pool })
    }

    /// Build ServerDeps with the given fixed committee and fresh mocks.
    pub fn deps_with_committee(&self, committee: Vec<MemberId>) -> TestDeps {
        let push = Arc::new(MockPushService::new());
        let ledger = Arc::new(MockPointsLedger::new());
        let roster = Arc::new(FixedCommitteeRoster::new(committee));

        TestDeps {
            deps: ServerDeps::new(
                self.db_pool.clone(),
                push.clone(),
                roster.clone(),
                Some(ledger.clone() as Arc<dyn BasePointsLedger>),
            ),
            push,
            ledger,
            roster,
        }
    }

    /// Like `deps_with_committee`, but every push delivery fails. For
    /// asserting that notification failures never roll back state.
    pub fn deps_with_failing_push(&self, committee: Vec<MemberId>) -> TestDeps {
        let push = Arc::new(MockPushService::failing());
        let ledger = Arc::new(MockPointsLedger::new());
        let roster = Arc::new(FixedCommitteeRoster::new(committee));

        TestDeps {
            deps: ServerDeps::new(
                self.db_pool.clone(),
                push.clone(),
                roster.clone(),
                Some(ledger.clone() as Arc<dyn BasePointsLedger>),
            ),
            push,
            ledger,
            roster,
        }
    }
}
