//! Configuration file loading
//!
//! Parses the `key<separator>value` text format shared by all backends:
//! UTF-8 text, one pair per line, `#`-prefixed comment lines and blank
//! lines skipped. Keys outside the backend's declared field table are
//! discarded with an informational notice; malformed entries abort the
//! load with the offending line number.

use std::io::BufRead;
use std::path::Path;

use crate::fields::{ConfigMap, FieldSpec};
use crate::{ConfigError, ConfigResult};

/// Default key/value separator
pub const DEFAULT_SEPARATOR: char = '=';

fn is_word(key: &str) -> bool {
    key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Read settings from a configuration text source
///
/// Returns a mapping restricted to the keys named in `fields`, with keys
/// lower-cased and values trimmed. Loading the same text twice yields the
/// same mapping.
///
/// # Errors
/// Returns a line-numbered `MalformedEntry`, `MissingKey` or `MissingValue`
/// for invalid entries, or `Io` if the source cannot be read.
pub fn load_config<R: BufRead>(
    source: R,
    fields: &[FieldSpec],
    separator: char,
) -> ConfigResult<ConfigMap> {
    let mut config = ConfigMap::new();

    for (index, line) in source.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        let number = index + 1;

        // skip blank or commented lines
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once(separator) else {
            return Err(ConfigError::MalformedEntry {
                line: number,
                text: line.to_string(),
            });
        };

        let key = raw_key.trim().to_lowercase();
        if key.is_empty() {
            return Err(ConfigError::MissingKey { line: number });
        }
        if !is_word(&key) {
            return Err(ConfigError::MalformedEntry {
                line: number,
                text: line.to_string(),
            });
        }

        let value = raw_value.trim();
        if value.is_empty() {
            return Err(ConfigError::MissingValue { line: number });
        }

        if fields.iter().any(|field| field.name == key) {
            config.insert(key, value.to_string());
        } else {
            tracing::info!("ignoring unknown entry on line {number}");
        }
    }

    Ok(config)
}

/// Read settings from a configuration file path
///
/// # Errors
/// Returns `FileNotFound` if the path does not resolve, otherwise the same
/// errors as [`load_config`].
pub fn load_config_file(
    path: impl AsRef<Path>,
    fields: &[FieldSpec],
    separator: char,
) -> ConfigResult<ConfigMap> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ConfigError::FileNotFound {
            path: path.to_path_buf(),
            cwd: std::env::current_dir().unwrap_or_default(),
        });
    }

    let file = std::fs::File::open(path)?;
    load_config(std::io::BufReader::new(file), fields, separator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::FieldKind;
    use std::io::Cursor;
    use std::io::Write;

    const FIELDS: &[FieldSpec] = &[
        FieldSpec::required("server", FieldKind::Text),
        FieldSpec::optional("username", FieldKind::Text),
        FieldSpec::optional("port", FieldKind::Integer),
    ];

    fn load(text: &str) -> ConfigResult<ConfigMap> {
        load_config(Cursor::new(text), FIELDS, DEFAULT_SEPARATOR)
    }

    #[test]
    fn loads_recognized_keys_and_skips_comments() {
        let text = " # this is a comment\n\nserver= myserver\nUSERNAME = alice\nport=28000\n";
        let config = load(text).unwrap();

        assert_eq!(config.get("server").map(String::as_str), Some("myserver"));
        assert_eq!(config.get("username").map(String::as_str), Some("alice"));
        assert_eq!(config.get("port").map(String::as_str), Some("28000"));
    }

    #[test]
    fn loading_is_idempotent() {
        let text = "server=myserver\nport= 28000\n";
        assert_eq!(load(text).unwrap(), load(text).unwrap());
    }

    #[test]
    fn unknown_keys_are_discarded_not_fatal() {
        let config = load("unknown_key= value\nserver= s\n").unwrap();
        assert!(!config.contains_key("unknown_key"));
        assert_eq!(config.len(), 1);
    }

    #[test]
    fn line_without_separator_is_malformed() {
        let err = load("server= ok\nuser: value\n").unwrap_err();
        match err {
            ConfigError::MalformedEntry { line, text } => {
                assert_eq!(line, 2);
                assert_eq!(text, "user: value");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_key_and_empty_value_are_line_numbered() {
        assert!(matches!(
            load("= value\n").unwrap_err(),
            ConfigError::MissingKey { line: 1 }
        ));
        assert!(matches!(
            load("# comment\nusername= \n").unwrap_err(),
            ConfigError::MissingValue { line: 2 }
        ));
    }

    #[test]
    fn alternate_separator() {
        let config = load_config(Cursor::new("server: myserver\n"), FIELDS, ':').unwrap();
        assert_eq!(config.get("server").map(String::as_str), Some("myserver"));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_config_file("doesnotexist.cfg", FIELDS, DEFAULT_SEPARATOR).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }

    #[test]
    fn loads_from_file_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# settings").unwrap();
        writeln!(file, "server = myserver").unwrap();
        file.flush().unwrap();

        let config = load_config_file(file.path(), FIELDS, DEFAULT_SEPARATOR).unwrap();
        assert_eq!(config.get("server").map(String::as_str), Some("myserver"));
    }
}
