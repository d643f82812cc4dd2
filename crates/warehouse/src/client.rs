//! Warehouse pool wrapper.

use std::str::FromStr;
use std::time::Duration;

use etl_core::{Error, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};
use tracing::info;

use crate::config::WarehouseConfig;

/// Warehouse storage handle with connection pooling.
///
/// Foreign keys are enforced on every connection so dimension rows
/// referenced by facts are delete-protected.
#[derive(Clone)]
pub struct Warehouse {
    pool: SqlitePool,
    config: WarehouseConfig,
}

impl Warehouse {
    /// Connect to the configured database, creating the file if needed.
    pub async fn connect(config: WarehouseConfig) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.database_url)
            .map_err(|e| Error::storage(format!("invalid database url: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(config.busy_timeout_secs));

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| Error::storage(format!("connect failed: {e}")))?;

        info!(
            database_url = %config.database_url,
            max_connections = config.max_connections,
            "Connected to warehouse"
        );

        Ok(Self { pool, config })
    }

    /// Connect to a private in-memory database (tests).
    ///
    /// The pool is pinned to a single never-expiring connection; an
    /// in-memory SQLite database lives and dies with its connection.
    pub async fn connect_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| Error::storage(format!("invalid database url: {e}")))?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| Error::storage(format!("connect failed: {e}")))?;

        Ok(Self {
            pool,
            config: WarehouseConfig {
                database_url: "sqlite::memory:".to_string(),
                max_connections: 1,
                ..WarehouseConfig::default()
            },
        })
    }

    /// Returns the inner pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Returns the configuration.
    pub fn config(&self) -> &WarehouseConfig {
        &self.config
    }

    /// Begin a transaction: the unit-of-work boundary for ingestion.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>> {
        self.pool
            .begin()
            .await
            .map_err(|e| Error::storage(format!("begin transaction: {e}")))
    }
}

/// Whether a sqlx error is a uniqueness-constraint violation. Losers of
/// a create race treat this as "already exists" and re-read.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}
