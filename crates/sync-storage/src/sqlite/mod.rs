use std::time::Duration;

use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use thiserror::Error;
use tracing::instrument;

mod binding;
mod migrate;
mod store_impl;

/// `SQLite`-backed [`crate::repository::Store`]. Holds a pooled connection;
/// cloning shares the pool.
#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SqliteInitError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl SqliteRepository {
    /// Connects to `SQLite` at the given URL with the default pool shape (5
    /// connections, 5s busy timeout), enforcing the pragmas the ingestion
    /// core depends on (foreign keys, WAL, a bounded busy timeout).
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if the connection cannot be established or
    /// the pragmas cannot be applied.
    pub async fn connect(database_url: &str) -> Result<Self, SqliteInitError> {
        Self::connect_with(database_url, 5, Duration::from_secs(5)).await
    }

    /// Connects to `SQLite` at the given URL with an explicit pool size and
    /// busy timeout, as driven by `IngestConfig`.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if the connection cannot be established or
    /// the pragmas cannot be applied.
    #[instrument(skip(database_url), fields(database_url, pool_max_connections, busy_timeout = ?busy_timeout))]
    pub async fn connect_with(
        database_url: &str,
        pool_max_connections: u32,
        busy_timeout: Duration,
    ) -> Result<Self, SqliteInitError> {
        let busy_timeout_ms = u64::try_from(busy_timeout.as_millis()).unwrap_or(u64::MAX);
        let pool = SqlitePoolOptions::new()
            .max_connections(pool_max_connections)
            .acquire_timeout(busy_timeout)
            .after_connect(move |conn, _meta| {
                Box::pin(async move {
                    sqlx::query("PRAGMA foreign_keys = ON;")
                        .execute(&mut *conn)
                        .await?;
                    sqlx::query("PRAGMA journal_mode = WAL;")
                        .execute(&mut *conn)
                        .await?;
                    sqlx::query(&format!("PRAGMA busy_timeout = {busy_timeout_ms};"))
                        .execute(&mut *conn)
                        .await?;
                    Ok(())
                })
            })
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Creates the schema if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if any migration statement fails.
    pub async fn migrate(&self) -> Result<(), SqliteInitError> {
        migrate::run_migrations(&self.pool).await
    }
}

impl crate::repository::Storage {
    /// Builds a `Storage` backed by `SQLite`, applying migrations first.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if connection or migration fails.
    pub async fn sqlite(database_url: &str) -> Result<Self, SqliteInitError> {
        let repo = SqliteRepository::connect(database_url).await?;
        repo.migrate().await?;
        Ok(Self {
            store: std::sync::Arc::new(repo),
        })
    }

    /// Builds a `Storage` backed by `SQLite` with an explicit pool shape,
    /// applying migrations first.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if connection or migration fails.
    pub async fn sqlite_with(
        database_url: &str,
        pool_max_connections: u32,
        busy_timeout: Duration,
    ) -> Result<Self, SqliteInitError> {
        let repo = SqliteRepository::connect_with(database_url, pool_max_connections, busy_timeout).await?;
        repo.migrate().await?;
        Ok(Self {
            store: std::sync::Arc::new(repo),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SqliteRepository>();
    }
}
