//! MongoDB facade client
//!
//! Owns a lazily-established driver handle. Connectivity failures during
//! `get_connection` are logged and reported as `None` so callers can poll
//! without error handling; everything else is delegated to the driver.

use std::path::Path;

use async_trait::async_trait;
use mongodb::bson::{doc, Bson, Document};
use mongodb::error::ErrorKind;
use mongodb::{Client, Collection, Database};

use dbkit_config::{ConfigError, Validate};

use crate::batch::{self, BulkInsertReport, BulkRejection, BulkSink, CapacityRetry, SinkError};
use crate::{MongoConfig, MongoError, MongoResult};

/// MongoDB client facade
#[derive(Debug)]
pub struct MongoDb {
    config: MongoConfig,
    retry: CapacityRetry,
    client: Option<Client>,
}

impl MongoDb {
    /// Create a facade from a validated configuration
    ///
    /// No connection is attempted until one is needed.
    ///
    /// # Errors
    /// Returns the configuration's validation error (missing server).
    pub fn new(config: MongoConfig) -> MongoResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            retry: CapacityRetry::default(),
            client: None,
        })
    }

    /// Create a facade from a configuration file
    ///
    /// # Errors
    /// Returns loader errors or the configuration's validation error.
    pub fn from_file(path: impl AsRef<Path>) -> MongoResult<Self> {
        Self::new(MongoConfig::from_file(path)?)
    }

    /// Override the batched-insert retry tuning
    #[must_use]
    pub fn with_retry_policy(mut self, retry: CapacityRetry) -> Self {
        self.retry = retry;
        self
    }

    /// The configuration backing this facade
    pub fn config(&self) -> &MongoConfig {
        &self.config
    }

    /// Establish a connection, replacing any existing handle
    ///
    /// # Errors
    /// Returns URI-building errors or the driver's connection/ping error.
    pub async fn connect(&mut self) -> MongoResult<()> {
        let uri = self.config.connection_uri()?;
        let client = Client::with_uri_str(&uri).await?;
        // the driver connects lazily, so ping to surface failures now
        client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await?;
        tracing::info!("connected to {}", self.config.summary());
        self.client = Some(client);
        Ok(())
    }

    /// Establish a connection if necessary, or return the existing one
    ///
    /// Connectivity failures are logged and reported as `None` rather than
    /// raised, so callers can poll.
    pub async fn get_connection(&mut self) -> Option<&Client> {
        if !self.is_connected().await {
            if let Err(err) = self.connect().await {
                tracing::warn!("get_connection: {err}");
                self.client = None;
            }
        }
        self.client.as_ref()
    }

    /// Check if connected to the database
    pub async fn is_connected(&self) -> bool {
        match &self.client {
            None => false,
            Some(client) => {
                // the ping command is cheap
                match client
                    .database("admin")
                    .run_command(doc! { "ping": 1 }, None)
                    .await
                {
                    Ok(_) => true,
                    Err(err) => {
                        tracing::warn!("is_connected: {err}");
                        false
                    }
                }
            }
        }
    }

    /// Check if connected and the credentials are accepted
    pub async fn is_authenticated(&self) -> bool {
        let Some(client) = &self.client else {
            return false;
        };
        // unlike ping, listing databases requires successful auth
        match client.list_database_names(None, None).await {
            Ok(_) => true,
            Err(err) => {
                tracing::warn!("is_authenticated: {err}");
                false
            }
        }
    }

    /// Drop the connection handle
    pub fn close_connection(&mut self) {
        if self.client.take().is_some() {
            tracing::debug!("connection closed: {}", self.config.summary());
        }
    }

    /// The configured database, or `None` (with a warning) when no
    /// connection or database name is available
    pub fn database(&self) -> Option<Database> {
        let client = self.client.as_ref()?;
        match self.config.dbname.as_deref() {
            Some(name) => Some(client.database(name)),
            None => {
                tracing::warn!("database not specified: {}", self.config.summary());
                None
            }
        }
    }

    /// The configured collection, or `None` (with a warning) when no
    /// connection, database name or collection name is available
    pub fn collection(&self) -> Option<Collection<Document>> {
        let database = self.database()?;
        match self.config.collection.as_deref() {
            Some(name) => Some(database.collection(name)),
            None => {
                tracing::warn!("collection not specified: {}", self.config.summary());
                None
            }
        }
    }

    /// Insert an ordered batch into the configured collection, falling
    /// back to chunked re-submission on a capacity rejection (see
    /// [`batch::insert_with_fallback`]).
    ///
    /// # Errors
    /// Returns `NotConnected` when no connection can be established,
    /// configuration errors for a missing database/collection name, and
    /// the batch module's errors otherwise.
    pub async fn insert_documents(&mut self, docs: &[Document]) -> MongoResult<BulkInsertReport> {
        if self.config.dbname.is_none() {
            return Err(MongoError::Configuration(ConfigError::missing_field(
                "dbname",
            )));
        }
        if self.config.collection.is_none() {
            return Err(MongoError::Configuration(ConfigError::missing_field(
                "collection",
            )));
        }

        let retry = self.retry.clone();
        if self.get_connection().await.is_none() {
            return Err(MongoError::NotConnected);
        }
        let collection = self.collection().ok_or(MongoError::NotConnected)?;
        let sink = CollectionSink { collection };
        batch::insert_with_fallback(&sink, docs, &retry).await
    }
}

/// `BulkSink` over a driver collection
struct CollectionSink {
    collection: Collection<Document>,
}

#[async_trait]
impl BulkSink for CollectionSink {
    async fn insert_batch(&self, docs: &[Document]) -> Result<Vec<Bson>, SinkError> {
        match self.collection.insert_many(docs, None).await {
            Ok(result) => {
                let mut ids: Vec<(usize, Bson)> = result.inserted_ids.into_iter().collect();
                ids.sort_by_key(|(index, _)| *index);
                Ok(ids.into_iter().map(|(_, id)| id).collect())
            }
            Err(err) => Err(classify(err)),
        }
    }
}

/// Split a driver error into a bulk-partial-failure (retry candidate) and
/// everything else (fatal).
fn classify(err: mongodb::error::Error) -> SinkError {
    if let ErrorKind::BulkWrite(failure) = &*err.kind {
        if let Some(first) = failure.write_errors.as_ref().and_then(|errors| errors.first()) {
            return SinkError::Rejected(BulkRejection {
                first_failed_index: first.index,
                code: first.code,
                message: first.message.clone(),
            });
        }
    }
    SinkError::Fatal(MongoError::Driver(err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor_rejects_missing_server() {
        let err = MongoDb::new(MongoConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            MongoError::Configuration(ConfigError::MissingField { .. })
        ));
    }

    #[test]
    fn missing_config_file_is_reported() {
        let err = MongoDb::from_file("doesnotexist.cfg").unwrap_err();
        assert!(matches!(
            err,
            MongoError::Configuration(ConfigError::FileNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn not_connected_until_a_connection_is_made() {
        let mut db = MongoDb::new(MongoConfig::new("myserver")).unwrap();
        assert!(!db.is_connected().await);
        assert!(!db.is_authenticated().await);
        assert!(db.database().is_none());
        assert!(db.collection().is_none());
        db.close_connection(); // idempotent on a closed facade
    }

    #[tokio::test]
    async fn insert_requires_database_and_collection_names() {
        let mut db = MongoDb::new(MongoConfig::new("myserver")).unwrap();
        let err = db.insert_documents(&[doc! {}]).await.unwrap_err();
        assert!(matches!(
            err,
            MongoError::Configuration(ConfigError::MissingField { .. })
        ));
    }
}
