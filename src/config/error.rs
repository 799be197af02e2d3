//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse config file")]
    Toml(#[from] toml::de::Error),

    #[error("Config validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_config_error_display() {
        let io_err = ConfigError::Io(
            PathBuf::from("pluma.toml"),
            Error::new(ErrorKind::NotFound, "file not found"),
        );
        let display = format!("{io_err}");
        assert!(display.contains("IO error"));
        assert!(display.contains("pluma.toml"));

        let validation_err = ConfigError::Validation("bad field".to_string());
        let display = format!("{validation_err}");
        assert!(display.contains("bad field"));
    }

    #[test]
    fn test_toml_error_from_parse_failure() {
        let parse_err = toml::from_str::<toml::Value>("[base").unwrap_err();
        let err = ConfigError::from(parse_err);
        assert!(matches!(err, ConfigError::Toml(_)));
        assert!(format!("{err}").contains("parse"));
    }
}
