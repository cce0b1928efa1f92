//! Error types for the document-store facade

use dbkit_config::ConfigError;
use thiserror::Error;

/// Result type alias for document-store operations
pub type DocumentResult<T> = Result<T, DocumentError>;

/// Errors that can occur in the document-store facade
#[derive(Error, Debug)]
pub enum DocumentError {
    /// Configuration loading or validation failed
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// Transport-level HTTP failure
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a status the operation cannot absorb
    #[error("unexpected status {status} for {link}: {body}")]
    UnexpectedStatus {
        status: u16,
        link: String,
        body: String,
    },
}
