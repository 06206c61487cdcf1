use std::env;
use std::time::Duration;

/// Tunables for a running ingestion core. Everything has a sane default so
/// the service boots without any environment configured.
#[derive(Clone, Debug)]
pub struct IngestConfig {
    /// Hard cap on operations accepted in one batch (spec.md §4.5).
    pub max_ops: u32,
    /// `SQLite` connection string used by `IngestService::connect_sqlite`.
    pub database_url: String,
    /// Pool size for the `SQLite` connection, mirroring the teacher's
    /// `SqlitePoolOptions::max_connections`.
    pub pool_max_connections: u32,
    /// `SQLite` busy timeout and pool acquire timeout.
    pub busy_timeout: Duration,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_ops: 10_000,
            database_url: "sqlite::memory:".to_string(),
            pool_max_connections: 5,
            busy_timeout: Duration::from_secs(5),
        }
    }
}

impl IngestConfig {
    /// Builds a config from environment variables, falling back to defaults
    /// for anything unset: `INGEST_MAX_OPS`, `INGEST_DATABASE_URL`,
    /// `INGEST_POOL_MAX_CONNECTIONS`, `INGEST_BUSY_TIMEOUT_MS`.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let max_ops = env::var("INGEST_MAX_OPS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.max_ops);
        let database_url = env::var("INGEST_DATABASE_URL").unwrap_or(defaults.database_url);
        let pool_max_connections = env::var("INGEST_POOL_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.pool_max_connections);
        let busy_timeout = env::var("INGEST_BUSY_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.busy_timeout);
        Self {
            max_ops,
            database_url,
            pool_max_connections,
            busy_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_cap_matches_spec() {
        assert_eq!(IngestConfig::default().max_ops, 10_000);
    }

    #[test]
    fn default_pool_shape_matches_the_teacher() {
        let config = IngestConfig::default();
        assert_eq!(config.pool_max_connections, 5);
        assert_eq!(config.busy_timeout, Duration::from_secs(5));
    }
}
