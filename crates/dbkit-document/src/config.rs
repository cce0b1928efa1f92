//! Typed document-store connection configuration

use std::io::BufRead;
use std::path::Path;

use dbkit_config::{
    load_config, load_config_file, validation, ConfigMap, ConfigResult, FieldKind, FieldSpec,
    Validate, DEFAULT_SEPARATOR,
};

/// Recognized configuration keys for the document-store facade
pub const FIELDS: &[FieldSpec] = &[
    FieldSpec::required("endpoint", FieldKind::Text),
    FieldSpec::required("key", FieldKind::Text),
    FieldSpec::optional("dbname", FieldKind::Text),
    FieldSpec::optional("container_name", FieldKind::Text),
];

/// Document-store connection parameters
#[derive(Debug, Clone, Default)]
pub struct DocumentConfig {
    /// URI of the database account
    pub endpoint: Option<String>,
    /// Primary key of the database account
    pub key: Option<String>,
    /// Name of the database
    pub dbname: Option<String>,
    /// Name of the database container
    pub container_name: Option<String>,
}

impl DocumentConfig {
    /// Configuration with the account credentials set
    pub fn new(endpoint: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            endpoint: Some(endpoint.into()),
            key: Some(key.into()),
            ..Self::default()
        }
    }

    /// Overlay loaded settings onto this configuration
    pub fn apply(&mut self, map: &ConfigMap) {
        if let Some(endpoint) = dbkit_config::fields::text_field(map, "endpoint") {
            self.endpoint = Some(endpoint);
        }
        if let Some(key) = dbkit_config::fields::text_field(map, "key") {
            self.key = Some(key);
        }
        if let Some(dbname) = dbkit_config::fields::text_field(map, "dbname") {
            self.dbname = Some(dbname);
        }
        if let Some(container_name) = dbkit_config::fields::text_field(map, "container_name") {
            self.container_name = Some(container_name);
        }
    }

    /// Build a configuration from an already-loaded mapping
    pub fn from_map(map: &ConfigMap) -> Self {
        let mut config = Self::default();
        config.apply(map);
        config
    }

    /// Read settings from a configuration text source
    ///
    /// # Errors
    /// Returns loader errors (see `dbkit_config::load_config`).
    pub fn from_reader<R: BufRead>(source: R) -> ConfigResult<Self> {
        Ok(Self::from_map(&load_config(source, FIELDS, DEFAULT_SEPARATOR)?))
    }

    /// Read settings from a configuration file path
    ///
    /// # Errors
    /// Returns `FileNotFound` for a missing path or loader errors.
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        Ok(Self::from_map(&load_config_file(
            path,
            FIELDS,
            DEFAULT_SEPARATOR,
        )?))
    }

    /// Connection info for logging, without the account key
    pub fn summary(&self) -> String {
        format!(
            "{}/{}",
            self.endpoint.as_deref().unwrap_or("<unset>"),
            self.dbname.as_deref().unwrap_or("<unset>"),
        )
    }
}

impl Validate for DocumentConfig {
    fn validate(&self) -> ConfigResult<()> {
        validation::require(self.endpoint.as_ref(), "endpoint")?;
        validation::require(self.key.as_ref(), "key")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbkit_config::ConfigError;
    use std::io::Cursor;

    #[test]
    fn config_file_populates_recognized_keys() {
        let text = "# account\n\
                    endpoint= https://myaccount.example.net:443/\n\
                    key= supersecretkey\n\
                    dbname= mydatabase\n\
                    container_name= mycontainer\n\
                    unknown_key= ignored\n";
        let config = DocumentConfig::from_reader(Cursor::new(text)).unwrap();

        assert_eq!(
            config.endpoint.as_deref(),
            Some("https://myaccount.example.net:443/")
        );
        assert_eq!(config.key.as_deref(), Some("supersecretkey"));
        assert_eq!(config.dbname.as_deref(), Some("mydatabase"));
        assert_eq!(config.container_name.as_deref(), Some("mycontainer"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn from_file_reads_a_config_on_disk() {
        use std::io::Write as _;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "endpoint= https://myaccount.example.net").unwrap();
        writeln!(file, "key= supersecretkey").unwrap();

        let config = DocumentConfig::from_file(file.path()).unwrap();
        assert_eq!(
            config.endpoint.as_deref(),
            Some("https://myaccount.example.net")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_credentials_fail_validation() {
        let config = DocumentConfig::from_reader(Cursor::new("dbname= d\n")).unwrap();
        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::MissingField { .. }
        ));
    }

    #[test]
    fn summary_never_contains_the_key() {
        let mut config = DocumentConfig::new("https://myaccount.example.net", "supersecretkey");
        config.dbname = Some("mydatabase".to_string());
        assert!(!config.summary().contains("supersecretkey"));
        assert!(config.summary().contains("mydatabase"));
    }
}
