//! MongoDB client facade
//!
//! Wraps the driver behind a small connection-management surface: typed
//! configuration loaded from `key=value` files, URI assembly, lazy
//! connection with logged (not raised) connectivity failures, and a
//! batched insert that falls back to chunked re-submission when a
//! throughput-limited backend rejects part of an ordered bulk write.
//!
//! ```no_run
//! use dbkit_mongo::{MongoConfig, MongoDb};
//! use mongodb::bson::doc;
//!
//! # async fn example() -> dbkit_mongo::MongoResult<()> {
//! let mut config = MongoConfig::from_file("mongo.cfg")?;
//! config.collection = Some("events".to_string());
//! let mut db = MongoDb::new(config)?;
//! db.insert_documents(&[doc! { "kind": "login" }]).await?;
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod client;
pub mod config;
pub mod error;
pub mod mock;

pub use batch::{
    insert_with_fallback, BulkInsertReport, BulkRejection, BulkSink, CapacityRetry, SinkError,
    CAPACITY_ERROR_CODE,
};
pub use client::MongoDb;
pub use config::MongoConfig;
pub use error::{MongoError, MongoResult};
