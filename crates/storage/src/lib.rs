//! Persistence layer for the adaptive learning orchestration core (§6).
//!
//! Each repository here implements a persistence-boundary trait defined in
//! its owning component crate (`adaptive-journey::JourneyRepository`,
//! `adaptive-content::DailyContextRepository`, `adaptive-game::GameRepository`)
//! against the Postgres tables in §6's table list. The component crates
//! never depend on this one -- they're exercised against in-memory fakes in
//! their own test modules, and wired to these Postgres-backed
//! implementations only at `main`.

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

pub mod error;
pub mod game_repository;
pub mod journey_repository;
pub mod context_repository;

pub use error::StorageError;
pub use game_repository::PgGameRepository;
pub use journey_repository::PgJourneyRepository;
pub use context_repository::PgDailyContextRepository;

/// Create a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool, StorageError> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .map_err(StorageError::Connection)
}

/// Run database migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), StorageError> {
    sqlx::migrate!("../../migrations")
        .run(pool)
        .await
        .map_err(StorageError::Migration)
}

/// Check database connectivity.
pub async fn check_connection(pool: &PgPool) -> Result<(), StorageError> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map_err(StorageError::Query)?;
    Ok(())
}
