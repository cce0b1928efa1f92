//! PostgreSQL facade client
//!
//! Owns a lazily-created connection pool. Connectivity failures during
//! `get_connection` are logged and reported as `None`; the table helpers
//! return their empty sentinel when no connection is available instead of
//! raising.

use std::path::Path;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use dbkit_config::Validate;

use crate::sql;
use crate::{PostgresConfig, PostgresResult};

/// Pool sizing and timeouts
#[derive(Debug, Clone)]
pub struct PoolTuning {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
}

impl Default for PoolTuning {
    fn default() -> Self {
        Self {
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
        }
    }
}

/// PostgreSQL client facade
#[derive(Debug)]
pub struct PostgresDb {
    config: PostgresConfig,
    tuning: PoolTuning,
    pool: Option<PgPool>,
}

impl PostgresDb {
    /// Create a facade from a validated configuration
    ///
    /// No connection is attempted until one is needed.
    ///
    /// # Errors
    /// Returns the configuration's validation error (missing user,
    /// password or dbname).
    pub fn new(config: PostgresConfig) -> PostgresResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            tuning: PoolTuning::default(),
            pool: None,
        })
    }

    /// Create a facade from a configuration file
    ///
    /// # Errors
    /// Returns loader errors or the configuration's validation error.
    pub fn from_file(path: impl AsRef<Path>) -> PostgresResult<Self> {
        Self::new(PostgresConfig::from_file(path)?)
    }

    /// Override the pool tuning
    #[must_use]
    pub fn with_pool_tuning(mut self, tuning: PoolTuning) -> Self {
        self.tuning = tuning;
        self
    }

    /// The configuration backing this facade
    pub fn config(&self) -> &PostgresConfig {
        &self.config
    }

    /// Create the pool, replacing any existing one
    ///
    /// # Errors
    /// Returns option-building errors or the driver's connection error.
    pub async fn connect(&mut self) -> PostgresResult<()> {
        let options = self.config.connect_options()?;
        let pool = PgPoolOptions::new()
            .max_connections(self.tuning.max_connections)
            .acquire_timeout(self.tuning.acquire_timeout)
            .idle_timeout(self.tuning.idle_timeout)
            .connect_with(options)
            .await?;
        tracing::info!("connected to {}", self.config.summary());
        self.pool = Some(pool);
        Ok(())
    }

    /// Create the pool if necessary, or return the existing one
    ///
    /// Connectivity failures are logged and reported as `None` rather than
    /// raised, so callers can poll.
    pub async fn get_connection(&mut self) -> Option<&PgPool> {
        if !self.is_connected() {
            if let Err(err) = self.connect().await {
                tracing::warn!("get_connection: {err}");
                self.pool = None;
            }
        }
        self.pool.as_ref()
    }

    /// Check if a usable pool is held
    pub fn is_connected(&self) -> bool {
        self.pool.as_ref().is_some_and(|pool| !pool.is_closed())
    }

    /// Close the pool and drop it
    pub async fn close_connection(&mut self) {
        if let Some(pool) = self.pool.take() {
            pool.close().await;
            tracing::debug!("connection closed: {}", self.config.summary());
        }
    }

    /// Check if a table exists in the connected database
    ///
    /// Returns `Ok(None)` (after a warning) when no connection is
    /// available.
    ///
    /// # Errors
    /// Returns the driver's query error.
    pub async fn table_exists(&mut self, name: &str) -> PostgresResult<Option<bool>> {
        let Some(pool) = self.get_connection().await.cloned() else {
            tracing::warn!("no connection available, cannot check table \"{name}\"");
            return Ok(None);
        };
        let exists: bool = sqlx::query_scalar(&sql::table_exists_sql(name))
            .fetch_one(&pool)
            .await?;
        Ok(Some(exists))
    }

    /// Count the rows in a table
    ///
    /// Returns `Ok(None)` (after a warning) when no connection is
    /// available.
    ///
    /// # Errors
    /// Returns the driver's query error.
    pub async fn row_count(&mut self, name: &str) -> PostgresResult<Option<i64>> {
        let Some(pool) = self.get_connection().await.cloned() else {
            tracing::warn!("no connection available, cannot count \"{name}\"");
            return Ok(None);
        };
        let count: i64 = sqlx::query_scalar(&sql::count_sql(name))
            .fetch_one(&pool)
            .await?;
        Ok(Some(count))
    }

    /// Estimate the rows in a table from planner statistics; an unknown
    /// table estimates to 0
    ///
    /// Returns `Ok(None)` (after a warning) when no connection is
    /// available.
    ///
    /// # Errors
    /// Returns the driver's query error.
    pub async fn estimated_row_count(&mut self, name: &str) -> PostgresResult<Option<i64>> {
        let Some(pool) = self.get_connection().await.cloned() else {
            tracing::warn!("no connection available, cannot estimate \"{name}\"");
            return Ok(None);
        };
        let estimate: Option<i64> = sqlx::query_scalar(&sql::estimate_count_sql(name))
            .fetch_optional(&pool)
            .await?;
        Ok(Some(estimate.unwrap_or(0)))
    }

    /// Drop a table if it exists, cascading to dependent objects
    ///
    /// Returns `Ok(false)` (after a warning) when no connection is
    /// available, `Ok(true)` once the statement ran.
    ///
    /// # Errors
    /// Returns the driver's query error.
    pub async fn drop_table(&mut self, name: &str) -> PostgresResult<bool> {
        let Some(pool) = self.get_connection().await.cloned() else {
            tracing::warn!("no connection available, cannot drop \"{name}\"");
            return Ok(false);
        };
        sqlx::query(&sql::drop_table_sql(name))
            .execute(&pool)
            .await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbkit_config::ConfigError;
    use crate::PostgresError;

    fn unreachable_db() -> PostgresDb {
        let mut config = PostgresConfig::new("postgres", "verysecret", "mydatabase");
        // nothing listens on port 1, so connection attempts fail fast
        config.host = Some("127.0.0.1".to_string());
        config.port = Some(1);
        PostgresDb::new(config)
            .unwrap()
            .with_pool_tuning(PoolTuning {
                acquire_timeout: Duration::from_secs(2),
                ..PoolTuning::default()
            })
    }

    #[test]
    fn constructor_rejects_missing_required_fields() {
        let err = PostgresDb::new(PostgresConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            PostgresError::Configuration(ConfigError::MissingField { .. })
        ));
    }

    #[test]
    fn missing_config_file_is_reported() {
        let err = PostgresDb::from_file("doesnotexist.cfg").unwrap_err();
        assert!(matches!(
            err,
            PostgresError::Configuration(ConfigError::FileNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn helpers_return_the_empty_sentinel_without_a_connection() {
        let mut db = unreachable_db();
        assert!(!db.is_connected());
        assert_eq!(db.table_exists("mytable").await.unwrap(), None);
        assert_eq!(db.row_count("mytable").await.unwrap(), None);
        assert_eq!(db.estimated_row_count("mytable").await.unwrap(), None);
        assert!(!db.drop_table("mytable").await.unwrap());
        db.close_connection().await; // idempotent on a closed facade
    }
}
