//! Shared configuration machinery for the dbkit database facades
//!
//! This crate owns the three concerns every backend facade repeats:
//!
//! 1. Parsing the `key=value` configuration file format into a mapping
//!    restricted to the backend's declared field table ([`reader`]).
//! 2. Declaring those fields once per backend, with required/optional and
//!    text/integer/boolean kinds, and coercing loaded values ([`fields`]).
//! 3. Assembling connection URIs with fixed component ordering and
//!    percent-encoded credentials ([`uri`]).
//!
//! No logging subscriber is installed here; callers own `tracing`
//! initialization.

pub mod error;
pub mod fields;
pub mod reader;
pub mod uri;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use fields::{ConfigMap, FieldKind, FieldSpec};
pub use reader::{load_config, load_config_file, DEFAULT_SEPARATOR};
pub use uri::UriParts;
pub use validation::Validate;
