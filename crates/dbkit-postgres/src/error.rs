//! Error types for the PostgreSQL facade

use dbkit_config::ConfigError;
use thiserror::Error;

/// Result type alias for PostgreSQL facade operations
pub type PostgresResult<T> = Result<T, PostgresError>;

/// Errors that can occur in the PostgreSQL facade
#[derive(Error, Debug)]
pub enum PostgresError {
    /// Configuration loading or validation failed
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// Pass-through driver error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}
