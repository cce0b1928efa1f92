//! Configuration validation helpers

use crate::{ConfigError, ConfigResult};

/// Trait for validating configuration values
pub trait Validate {
    /// Validate this configuration object
    ///
    /// # Errors
    /// Returns validation errors if the configuration is invalid
    fn validate(&self) -> ConfigResult<()>;
}

/// Require a field to be present, returning its value
///
/// # Errors
/// Returns `ConfigError::MissingField` naming the field when absent.
pub fn require<'a>(value: Option<&'a String>, field: &str) -> ConfigResult<&'a str> {
    value
        .map(String::as_str)
        .ok_or_else(|| ConfigError::missing_field(field))
}

/// Validate a string is not empty or whitespace-only
///
/// # Errors
/// Returns `ConfigError::MissingField` if the string is empty after trim.
pub fn validate_non_empty(value: &str, field: &str) -> ConfigResult<()> {
    if value.trim().is_empty() {
        Err(ConfigError::missing_field(field))
    } else {
        Ok(())
    }
}
