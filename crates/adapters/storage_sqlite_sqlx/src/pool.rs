//! `SQLite` connection pool setup and migration runner.

use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::error::{ConfigError, StorageError};

/// Pool size used when `PROVISIONING_DATABASE_MAX_CONNECTIONS` is unset.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Configuration for the `SQLite` storage adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// `SQLite` connection URL (e.g. `sqlite:numbers.db` or `sqlite::memory:`).
    pub database_url: String,
    pub max_connections: u32,
}

impl Config {
    /// Configuration for `database_url` with the default pool size.
    #[must_use]
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }

    /// Read configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `PROVISIONING_DATABASE_URL` is not set, or if
    /// `PROVISIONING_DATABASE_MAX_CONNECTIONS` is set but not a number.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            std::env::var("PROVISIONING_DATABASE_URL").map_err(ConfigError::MissingDatabaseUrl)?;
        let max_connections = std::env::var("PROVISIONING_DATABASE_MAX_CONNECTIONS")
            .ok()
            .map(|raw| parse_max_connections(&raw))
            .transpose()?
            .unwrap_or(DEFAULT_MAX_CONNECTIONS);
        Ok(Self {
            database_url,
            max_connections,
        })
    }

    /// Build a [`Database`] from this configuration.
    ///
    /// Creates the connection pool, creates the database file if missing,
    /// and runs all pending migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the connection or migrations fail.
    pub async fn build(self) -> Result<Database, StorageError> {
        Database::initialize(&self).await
    }
}

fn parse_max_connections(raw: &str) -> Result<u32, ConfigError> {
    raw.trim()
        .parse::<std::num::NonZeroU32>()
        .map(std::num::NonZeroU32::get)
        .map_err(ConfigError::InvalidMaxConnections)
}

/// Holds the `SQLite` connection pool and provides access to it.
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    async fn initialize(config: &Config) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(&config.database_url)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        tracing::info!(
            max_connections = config.max_connections,
            "incoming phone number storage ready"
        );

        Ok(Self { pool })
    }

    /// Borrow the underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn should_create_pool_and_run_migrations_when_using_memory_db() {
        let db = Config::new("sqlite::memory:").build().await.unwrap();

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' AND name != '_sqlx_migrations' \
             ORDER BY name",
        )
        .fetch_all(db.pool())
        .await
        .unwrap();

        let names: Vec<&str> = tables.iter().map(|row| row.0.as_str()).collect();
        assert_eq!(names, ["applications", "incoming_phone_numbers"]);
    }

    #[test]
    fn should_default_pool_size() {
        let config = Config::new("sqlite::memory:");
        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
    }

    #[test]
    fn should_parse_max_connections() {
        assert_eq!(parse_max_connections(" 12 ").unwrap(), 12);
        assert!(matches!(
            parse_max_connections("0"),
            Err(ConfigError::InvalidMaxConnections(_))
        ));
        assert!(matches!(
            parse_max_connections("many"),
            Err(ConfigError::InvalidMaxConnections(_))
        ));
    }
}
