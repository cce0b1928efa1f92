//! Backend field declarations and value coercion
//!
//! Each backend declares its recognized configuration keys as a single
//! `FIELDS` table. The table drives the config-file loader (which keys are
//! kept) and the typed-config constructors (how values are coerced), so the
//! per-backend key/required/type tuples live in exactly one place.

use std::collections::BTreeMap;
use std::str::FromStr;

use crate::{ConfigError, ConfigResult};

/// Value type a configuration field accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free-form string
    Text,
    /// Must parse as an integer
    Integer,
    /// Must be `true` or `false` (case-insensitive)
    Boolean,
}

/// Declaration of a single recognized configuration field
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Lower-case key name as it appears in configuration files
    pub name: &'static str,
    /// Whether a live connection may be attempted without this field
    pub required: bool,
    /// Coercion applied when building the typed configuration
    pub kind: FieldKind,
}

impl FieldSpec {
    /// Declare a required field
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            required: true,
            kind,
        }
    }

    /// Declare an optional field
    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            required: false,
            kind,
        }
    }
}

/// Mapping from recognized field name to trimmed string value
pub type ConfigMap = BTreeMap<String, String>;

/// Look up a text field, cloning the stored value
pub fn text_field(map: &ConfigMap, field: &str) -> Option<String> {
    map.get(field).cloned()
}

/// Look up and coerce an integer field
///
/// # Errors
/// Returns `ConfigError::InvalidFieldType` when the stored value does not
/// parse as the requested integer type.
pub fn integer_field<T: FromStr>(map: &ConfigMap, field: &str) -> ConfigResult<Option<T>> {
    match map.get(field) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidFieldType {
                field: field.to_string(),
                expected: "integer",
                value: raw.clone(),
            }),
    }
}

/// Look up and coerce a boolean field
///
/// Only `true` and `false` (any casing) are accepted.
///
/// # Errors
/// Returns `ConfigError::InvalidFieldType` for any other value.
pub fn boolean_field(map: &ConfigMap, field: &str) -> ConfigResult<Option<bool>> {
    match map.get(field) {
        None => Ok(None),
        Some(raw) if raw.eq_ignore_ascii_case("true") => Ok(Some(true)),
        Some(raw) if raw.eq_ignore_ascii_case("false") => Ok(Some(false)),
        Some(raw) => Err(ConfigError::InvalidFieldType {
            field: field.to_string(),
            expected: "boolean",
            value: raw.clone(),
        }),
    }
}
