//! Configuration error types

use std::path::PathBuf;
use thiserror::Error;

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Line is not a `key<separator>value` entry
    #[error("invalid configuration entry on line {line}: {text}")]
    MalformedEntry { line: usize, text: String },

    /// Entry has an empty key
    #[error("missing key entry on line {line}")]
    MissingKey { line: usize },

    /// Entry has an empty value
    #[error("missing value entry on line {line}")]
    MissingValue { line: usize },

    /// Configuration file path does not resolve
    #[error("configuration file does not exist: {path} (current working directory: {cwd})")]
    FileNotFound { path: PathBuf, cwd: PathBuf },

    /// Missing required field
    #[error("missing {field} configuration")]
    MissingField { field: String },

    /// Cross-field constraint violated
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    /// Field value failed integer/boolean coercion
    #[error("invalid value for {field}: expected {expected}, got \"{value}\"")]
    InvalidFieldType {
        field: String,
        expected: &'static str,
        value: String,
    },

    /// IO error while reading a configuration source
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    /// Shorthand for a `MissingField` error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Shorthand for an `InvalidConfiguration` error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
