//! # Database Bootstrap
//!
//! Opens the SQLite connection pool backing the offline store and brings the
//! schema up to date.
//!
//! - **WAL mode** so readers keep a consistent snapshot while a writer commits
//! - **Busy timeout** so concurrent writers queue on the lock instead of failing
//! - **Embedded migrations** applied once per database; re-running is a no-op
//! - **Optional quota** through `max_page_count`

use crate::config::{DatabaseLocation, OfflineStoreConfig, PAGE_SIZE_BYTES};
use crate::error::Result;
use core_runtime::logging::strip_path;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{
    SqliteAutoVacuum, SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions,
    SqliteSynchronous,
};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::{debug, info, warn};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Create the connection pool, run migrations and verify the database responds.
pub async fn create_pool(config: &OfflineStoreConfig) -> Result<SqlitePool> {
    config.validate()?;

    info!(
        database = %strip_path(&config.location.to_string()),
        in_memory = config.is_in_memory(),
        min_connections = config.min_connections,
        max_connections = config.max_connections,
        quota_bytes = ?config.max_database_size_bytes,
        "Opening offline media database"
    );

    let base_options = match &config.location {
        DatabaseLocation::File(path) => SqliteConnectOptions::new().filename(path),
        DatabaseLocation::Memory => SqliteConnectOptions::from_str("sqlite::memory:")?,
    };

    let mut connect_options = base_options
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .create_if_missing(true)
        .busy_timeout(config.busy_timeout)
        // page_size only takes effect on a fresh database; quotas assume it
        .page_size(PAGE_SIZE_BYTES)
        .auto_vacuum(SqliteAutoVacuum::Incremental)
        .statement_cache_capacity(config.statement_cache_capacity);

    if let Some(pages) = config.max_page_count() {
        connect_options = connect_options.pragma("max_page_count", pages.to_string());
    }

    let mut pool_options = SqlitePoolOptions::new()
        .min_connections(config.min_connections)
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout);

    // Closing the last connection drops an in-memory database.
    if config.is_in_memory() {
        pool_options = pool_options.idle_timeout(None).max_lifetime(None);
    }

    let pool = pool_options
        .connect_with(connect_options)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to open offline media database");
            e
        })?;

    run_migrations(&pool).await?;
    health_check(&pool).await?;

    info!(connections = pool.size(), "Offline media database ready");
    Ok(pool)
}

async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    debug!("Running offline store migrations");

    MIGRATOR.run(pool).await.map_err(|e| {
        warn!(error = %e, "Offline store migration failed");
        e
    })?;

    debug!("Offline store migrations up to date");
    Ok(())
}

pub(crate) async fn health_check(pool: &SqlitePool) -> Result<()> {
    sqlx::query("SELECT 1").fetch_one(pool).await.map_err(|e| {
        warn!(error = %e, "Offline store health check failed");
        e
    })?;

    Ok(())
}
