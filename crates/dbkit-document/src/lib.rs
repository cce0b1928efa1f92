//! Document-store client facade
//!
//! REST client for a partitioned JSON document service: typed configuration
//! loaded from `key=value` files, database/container lifecycle with
//! idempotent `ensure_*` operations, document upsert, generated select
//! queries, and delete-by-query.
//!
//! ```no_run
//! use dbkit_document::{DocumentStore, Selection};
//!
//! # async fn example() -> dbkit_document::DocumentResult<()> {
//! let store = DocumentStore::from_file("docstore.cfg")?;
//! store.ensure_database().await?;
//! store.ensure_container(&["/day"]).await?;
//! let docs = store
//!     .query_items(Selection::All, &[("day", "\"monday\"")])
//!     .await?;
//! # let _ = docs;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod query;
pub mod store;

pub use config::DocumentConfig;
pub use error::{DocumentError, DocumentResult};
pub use query::{select, Selection, DEFAULT_ALIAS};
pub use store::{DocumentStore, DEFAULT_PARTITION_PATH};
