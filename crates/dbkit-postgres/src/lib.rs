//! PostgreSQL client facade
//!
//! Wraps the driver pool behind a small connection-management surface:
//! typed configuration loaded from `key=value` files, lazy pool creation
//! with logged (not raised) connectivity failures, and table housekeeping
//! helpers that fall back to an empty sentinel when no connection is
//! available.
//!
//! ```no_run
//! use dbkit_postgres::PostgresDb;
//!
//! # async fn example() -> dbkit_postgres::PostgresResult<()> {
//! let mut db = PostgresDb::from_file("postgres.cfg")?;
//! if db.table_exists("events").await?.unwrap_or(false) {
//!     let rows = db.row_count("events").await?;
//!     println!("{rows:?}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod sql;

pub use client::{PoolTuning, PostgresDb};
pub use config::PostgresConfig;
pub use error::{PostgresError, PostgresResult};
