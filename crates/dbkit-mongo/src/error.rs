//! Error types for the MongoDB facade

use dbkit_config::ConfigError;
use thiserror::Error;

/// Result type alias for MongoDB facade operations
pub type MongoResult<T> = Result<T, MongoError>;

/// Errors that can occur in the MongoDB facade
#[derive(Error, Debug)]
pub enum MongoError {
    /// Configuration loading or validation failed
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// Pass-through driver error
    #[error("driver error: {0}")]
    Driver(#[from] mongodb::error::Error),

    /// Bulk write rejected for a reason the facade does not retry
    #[error("bulk write rejected at index {index} (code {code}): {message}")]
    BulkWrite {
        index: usize,
        code: i32,
        message: String,
    },

    /// Batched insert completed but the totals do not add up
    #[error("bulk insert count mismatch: expected {expected}, inserted {inserted}")]
    CountMismatch { expected: usize, inserted: usize },

    /// Operation needs a live connection and none is available
    #[error("no connection available")]
    NotConnected,

    /// Generic error for other issues
    #[error("{0}")]
    Other(String),
}
