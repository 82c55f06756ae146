//! PostgreSQL-backed Result Store Gateway and external job
//! queue for BountyForge.
//!
//! `PgResultStore` implements `bountyforge_core::store::ResultStore`;
//! `PgJobQueue` implements `bountyforge_core::queue::JobQueue`. Both hold
//! a cloned `sqlx::PgPool`: one struct per contract, wrapping a pool.

pub mod error;
pub mod queue;
pub mod store;

pub use error::{DbError, DbResult};
pub use queue::PgJobQueue;
pub use store::PgResultStore;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Create a new database connection pool.
pub async fn create_pool(database_url: &str) -> DbResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Run database migrations.
pub async fn run_migrations(pool: &PgPool) -> DbResult<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
