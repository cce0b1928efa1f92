//! Typed PostgreSQL connection configuration

use std::io::BufRead;
use std::path::Path;

use sqlx::postgres::PgConnectOptions;

use dbkit_config::{
    load_config, load_config_file, validation, ConfigMap, ConfigResult, FieldKind, FieldSpec,
    Validate, DEFAULT_SEPARATOR,
};

/// Recognized configuration keys for the PostgreSQL facade
pub const FIELDS: &[FieldSpec] = &[
    FieldSpec::required("user", FieldKind::Text),
    FieldSpec::required("password", FieldKind::Text),
    FieldSpec::required("dbname", FieldKind::Text),
    FieldSpec::optional("host", FieldKind::Text),
    FieldSpec::optional("port", FieldKind::Integer),
];

/// PostgreSQL connection parameters
#[derive(Debug, Clone, Default)]
pub struct PostgresConfig {
    /// User name used to authenticate
    pub user: Option<String>,
    /// Password used to authenticate
    pub password: Option<String>,
    /// The database name
    pub dbname: Option<String>,
    /// Database host address, driver default (localhost) when unset
    pub host: Option<String>,
    /// Connection port number, driver default 5432 when unset
    pub port: Option<u16>,
}

impl PostgresConfig {
    /// Configuration with the required fields set
    pub fn new(
        user: impl Into<String>,
        password: impl Into<String>,
        dbname: impl Into<String>,
    ) -> Self {
        Self {
            user: Some(user.into()),
            password: Some(password.into()),
            dbname: Some(dbname.into()),
            ..Self::default()
        }
    }

    /// Overlay loaded settings onto this configuration
    ///
    /// # Errors
    /// Returns `InvalidFieldType` when the port fails integer coercion.
    pub fn apply(&mut self, map: &ConfigMap) -> ConfigResult<()> {
        if let Some(user) = dbkit_config::fields::text_field(map, "user") {
            self.user = Some(user);
        }
        if let Some(password) = dbkit_config::fields::text_field(map, "password") {
            self.password = Some(password);
        }
        if let Some(dbname) = dbkit_config::fields::text_field(map, "dbname") {
            self.dbname = Some(dbname);
        }
        if let Some(host) = dbkit_config::fields::text_field(map, "host") {
            self.host = Some(host);
        }
        if let Some(port) = dbkit_config::fields::integer_field(map, "port")? {
            self.port = Some(port);
        }
        Ok(())
    }

    /// Build a configuration from an already-loaded mapping
    ///
    /// # Errors
    /// Returns `InvalidFieldType` on coercion failure.
    pub fn from_map(map: &ConfigMap) -> ConfigResult<Self> {
        let mut config = Self::default();
        config.apply(map)?;
        Ok(config)
    }

    /// Read settings from a configuration text source
    ///
    /// # Errors
    /// Returns loader errors (see `dbkit_config::load_config`) or
    /// coercion failures.
    pub fn from_reader<R: BufRead>(source: R) -> ConfigResult<Self> {
        Self::from_map(&load_config(source, FIELDS, DEFAULT_SEPARATOR)?)
    }

    /// Read settings from a configuration file path
    ///
    /// # Errors
    /// Returns `FileNotFound` for a missing path, loader errors, or
    /// coercion failures.
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        Self::from_map(&load_config_file(path, FIELDS, DEFAULT_SEPARATOR)?)
    }

    /// Driver connect options for the current fields
    ///
    /// # Errors
    /// Returns `MissingField` when a required field is unset.
    pub fn connect_options(&self) -> ConfigResult<PgConnectOptions> {
        let user = validation::require(self.user.as_ref(), "user")?;
        let password = validation::require(self.password.as_ref(), "password")?;
        let dbname = validation::require(self.dbname.as_ref(), "dbname")?;

        let mut options = PgConnectOptions::new()
            .username(user)
            .password(password)
            .database(dbname);
        if let Some(host) = &self.host {
            options = options.host(host);
        }
        if let Some(port) = self.port {
            options = options.port(port);
        }
        Ok(options)
    }

    /// Connection info for logging, without credentials
    pub fn summary(&self) -> String {
        format!(
            "{}:{}/{}",
            self.host.as_deref().unwrap_or("localhost"),
            self.port
                .map_or_else(|| "5432".to_string(), |p| p.to_string()),
            self.dbname.as_deref().unwrap_or("<unset>"),
        )
    }
}

impl Validate for PostgresConfig {
    fn validate(&self) -> ConfigResult<()> {
        validation::require(self.user.as_ref(), "user")?;
        validation::require(self.password.as_ref(), "password")?;
        validation::require(self.dbname.as_ref(), "dbname")?;
        Ok(())
    }
}
