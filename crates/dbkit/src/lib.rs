//! Database client facades over one configuration layer
//!
//! Umbrella crate re-exporting the per-backend facades:
//!
//! - [`config`] — `key=value` configuration files, field declarations and
//!   the connection-URI builder shared by the backends.
//! - [`document`] — REST document store (databases, containers, documents,
//!   generated select queries).
//! - [`mongo`] — MongoDB driver facade with the batched-insert capacity
//!   fallback.
//! - [`postgres`] — PostgreSQL pool facade with table housekeeping
//!   helpers.

pub use dbkit_config as config;
pub use dbkit_document as document;
pub use dbkit_mongo as mongo;
pub use dbkit_postgres as postgres;

pub use dbkit_config::{ConfigError, ConfigResult, Validate};
pub use dbkit_document::{DocumentConfig, DocumentStore};
pub use dbkit_mongo::{MongoConfig, MongoDb};
pub use dbkit_postgres::{PostgresConfig, PostgresDb};
