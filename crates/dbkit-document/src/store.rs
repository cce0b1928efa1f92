//! REST client for the document store
//!
//! Resources are addressed by link: `dbs/{db}`, `dbs/{db}/colls/{container}`
//! and `dbs/{db}/colls/{container}/docs/{id}`. Creation endpoints answer
//! 409 when the resource already exists, so `ensure_*` falls back to
//! reading the existing resource; existence checks absorb 404 into `false`.

use reqwest::{Response, StatusCode};
use serde_json::{json, Value};

use dbkit_config::{ConfigError, Validate};

use crate::query::{select, Selection, DEFAULT_ALIAS};
use crate::{DocumentConfig, DocumentError, DocumentResult};

/// Header carrying the account key
const API_KEY_HEADER: &str = "api-key";
/// Marks a document write as an upsert
const UPSERT_HEADER: &str = "x-ms-documentdb-is-upsert";
/// Marks a docs POST as a query
const QUERY_HEADER: &str = "x-ms-documentdb-isquery";
/// Allows a query to span partitions
const CROSS_PARTITION_HEADER: &str = "x-ms-documentdb-query-enablecrosspartition";
/// Partition key of the document addressed by a point operation
const PARTITION_KEY_HEADER: &str = "x-ms-documentdb-partitionkey";
/// Provisioned throughput requested for new containers
const OFFER_THROUGHPUT_HEADER: &str = "x-ms-offer-throughput";

const DEFAULT_OFFER_THROUGHPUT: u32 = 400;

/// Default partition key path for new containers
pub const DEFAULT_PARTITION_PATH: &str = "/id";

/// Document-store REST client
pub struct DocumentStore {
    config: DocumentConfig,
    base: String,
    http: reqwest::Client,
}

impl DocumentStore {
    /// Create a client from a validated configuration
    ///
    /// # Errors
    /// Returns the configuration's validation error (missing endpoint or
    /// key) or an HTTP client construction failure.
    pub fn new(config: DocumentConfig) -> DocumentResult<Self> {
        config.validate()?;
        // validate() guarantees the endpoint is present
        let base = config
            .endpoint
            .as_deref()
            .unwrap_or_default()
            .trim_end_matches('/')
            .to_string();
        let http = reqwest::Client::builder().build()?;
        Ok(Self { config, base, http })
    }

    /// Create a client from a configuration file
    ///
    /// # Errors
    /// Returns loader errors or the configuration's validation error.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> DocumentResult<Self> {
        Self::new(DocumentConfig::from_file(path)?)
    }

    /// The configuration backing this client
    pub fn config(&self) -> &DocumentConfig {
        &self.config
    }

    /// Link to the configured database: `dbs/{db}`
    ///
    /// # Errors
    /// Returns `MissingField` when no database name is configured.
    pub fn db_link(&self) -> DocumentResult<String> {
        let dbname = self
            .config
            .dbname
            .as_deref()
            .ok_or_else(|| ConfigError::missing_field("dbname"))?;
        Ok(format!("dbs/{dbname}"))
    }

    /// Link to the configured container: `dbs/{db}/colls/{container}`
    ///
    /// # Errors
    /// Returns `MissingField` when the database or container name is
    /// unconfigured.
    pub fn container_link(&self) -> DocumentResult<String> {
        let container = self
            .config
            .container_name
            .as_deref()
            .ok_or_else(|| ConfigError::missing_field("container_name"))?;
        Ok(format!("{}/colls/{container}", self.db_link()?))
    }

    /// Link to a document: `dbs/{db}/colls/{container}/docs/{id}`
    ///
    /// # Errors
    /// Returns `MissingField` when the database or container name is
    /// unconfigured.
    pub fn doc_link(&self, doc_id: &str) -> DocumentResult<String> {
        Ok(format!("{}/docs/{doc_id}", self.container_link()?))
    }

    fn key(&self) -> &str {
        self.config.key.as_deref().unwrap_or_default()
    }

    /// Check if the configured database exists
    ///
    /// # Errors
    /// Returns link errors, transport errors, or `UnexpectedStatus` for
    /// anything other than success/404.
    pub async fn database_exists(&self) -> DocumentResult<bool> {
        let link = self.db_link()?;
        self.resource_exists(&link).await
    }

    /// Create the configured database if it does not already exist
    ///
    /// # Errors
    /// Returns link errors, transport errors, or `UnexpectedStatus`.
    pub async fn ensure_database(&self) -> DocumentResult<Value> {
        let link = self.db_link()?;
        let dbname = self.config.dbname.as_deref().unwrap_or_default();
        let response = self
            .http
            .post(format!("{}/dbs", self.base))
            .header(API_KEY_HEADER, self.key())
            .json(&json!({ "id": dbname }))
            .send()
            .await?;

        if response.status() == StatusCode::CONFLICT {
            tracing::debug!("database {link} already exists, reading it");
            return self.read_resource(&link).await;
        }
        self.into_json(response, &link).await
    }

    /// Check if the configured container exists
    ///
    /// # Errors
    /// Returns link errors, transport errors, or `UnexpectedStatus` for
    /// anything other than success/404.
    pub async fn container_exists(&self) -> DocumentResult<bool> {
        let link = self.container_link()?;
        self.resource_exists(&link).await
    }

    /// Create the configured container if it does not already exist
    ///
    /// Partitioned by hash over `partition_paths`, e.g. `&["/id"]`.
    ///
    /// # Errors
    /// Returns link errors, transport errors, or `UnexpectedStatus`.
    pub async fn ensure_container(&self, partition_paths: &[&str]) -> DocumentResult<Value> {
        let link = self.container_link()?;
        let container = self.config.container_name.as_deref().unwrap_or_default();
        let definition = json!({
            "id": container,
            "partitionKey": { "paths": partition_paths, "kind": "Hash" },
        });
        let response = self
            .http
            .post(format!("{}/{}/colls", self.base, self.db_link()?))
            .header(API_KEY_HEADER, self.key())
            .header(OFFER_THROUGHPUT_HEADER, DEFAULT_OFFER_THROUGHPUT)
            .json(&definition)
            .send()
            .await?;

        if response.status() == StatusCode::CONFLICT {
            tracing::debug!("container {link} already exists, reading it");
            return self.read_resource(&link).await;
        }
        self.into_json(response, &link).await
    }

    /// Upsert a document into the configured container
    ///
    /// # Errors
    /// Returns link errors, transport errors, or `UnexpectedStatus`.
    pub async fn upsert_document(&self, document: &Value) -> DocumentResult<Value> {
        let link = format!("{}/docs", self.container_link()?);
        let response = self
            .http
            .post(format!("{}/{link}", self.base))
            .header(API_KEY_HEADER, self.key())
            .header(UPSERT_HEADER, "true")
            .json(document)
            .send()
            .await?;
        self.into_json(response, &link).await
    }

    /// Run a select statement against the configured container
    ///
    /// # Errors
    /// Returns link errors, transport errors, or `UnexpectedStatus`.
    pub async fn query_documents(&self, sql: &str) -> DocumentResult<Vec<Value>> {
        let link = format!("{}/docs", self.container_link()?);
        let response = self
            .http
            .post(format!("{}/{link}", self.base))
            .header(API_KEY_HEADER, self.key())
            .header(QUERY_HEADER, "true")
            .header(CROSS_PARTITION_HEADER, "true")
            .header(reqwest::header::CONTENT_TYPE, "application/query+json")
            .body(json!({ "query": sql, "parameters": [] }).to_string())
            .send()
            .await?;
        let body = self.into_json(response, &link).await?;

        // the service wraps results as {"Documents": [...]}
        match body {
            Value::Object(mut fields) => match fields.remove("Documents") {
                Some(Value::Array(documents)) => Ok(documents),
                _ => Ok(Vec::new()),
            },
            Value::Array(documents) => Ok(documents),
            _ => Ok(Vec::new()),
        }
    }

    /// Generate a select over the configured container and run it
    ///
    /// # Errors
    /// Returns `MissingField` when the container name is unconfigured,
    /// plus the errors of [`Self::query_documents`].
    pub async fn query_items(
        &self,
        selection: Selection<'_>,
        where_clauses: &[(&str, &str)],
    ) -> DocumentResult<Vec<Value>> {
        let container = self
            .config
            .container_name
            .as_deref()
            .ok_or_else(|| ConfigError::missing_field("container_name"))?;
        let sql = select(container, selection, DEFAULT_ALIAS, where_clauses);
        self.query_documents(&sql).await
    }

    /// Delete every document matching `where_clauses`, addressed under
    /// `partition_key`. The query API has no DELETE statement, so matches
    /// are fetched and removed one by one. A 404 on a delete is logged
    /// and yields an empty result rather than an error.
    ///
    /// # Errors
    /// Returns link errors, transport errors, or `UnexpectedStatus`.
    pub async fn delete_documents(
        &self,
        partition_key: &str,
        where_clauses: &[(&str, &str)],
    ) -> DocumentResult<Vec<String>> {
        let matches = self.query_items(Selection::All, where_clauses).await?;

        let mut deleted = Vec::with_capacity(matches.len());
        for item in matches {
            let Some(doc_id) = item.get("id").and_then(Value::as_str) else {
                tracing::warn!("skipping matched document without an id field");
                continue;
            };
            let link = self.doc_link(doc_id)?;
            let response = self
                .http
                .delete(format!("{}/{link}", self.base))
                .header(API_KEY_HEADER, self.key())
                .header(PARTITION_KEY_HEADER, json!([partition_key]).to_string())
                .send()
                .await?;

            match response.status() {
                status if status.is_success() => deleted.push(doc_id.to_string()),
                StatusCode::NOT_FOUND => {
                    tracing::warn!("delete not found: {link} on partition \"{partition_key}\"");
                    return Ok(Vec::new());
                }
                status => {
                    return Err(unexpected(status, &link, response).await);
                }
            }
        }
        Ok(deleted)
    }

    async fn resource_exists(&self, link: &str) -> DocumentResult<bool> {
        let response = self
            .http
            .get(format!("{}/{link}", self.base))
            .header(API_KEY_HEADER, self.key())
            .send()
            .await?;
        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(unexpected(status, link, response).await),
        }
    }

    async fn read_resource(&self, link: &str) -> DocumentResult<Value> {
        let response = self
            .http
            .get(format!("{}/{link}", self.base))
            .header(API_KEY_HEADER, self.key())
            .send()
            .await?;
        self.into_json(response, link).await
    }

    async fn into_json(&self, response: Response, link: &str) -> DocumentResult<Value> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json().await?)
        } else {
            Err(unexpected(status, link, response).await)
        }
    }
}

async fn unexpected(status: StatusCode, link: &str, response: Response) -> DocumentError {
    let body = response.text().await.unwrap_or_default();
    DocumentError::UnexpectedStatus {
        status: status.as_u16(),
        link: link.to_string(),
        body,
    }
}
