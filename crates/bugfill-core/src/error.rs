//! Core error types for bugfill.
//!
//! This module defines the central error type shared by the crates.
//! Each subsystem error is represented as a variant for clear error propagation.

use thiserror::Error;

/// Central error type for bugfill operations.
#[derive(Error, Debug)]
pub enum BugfillError {
    /// Configuration errors (file loading, parsing, validation)
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Issue record errors (empty or malformed input)
    #[error("invalid issue record: {0}")]
    Record(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to determine config directory path
    #[error("could not determine config directory (platform base directories not available)")]
    NoConfigDir,

    /// Failed to parse TOML
    #[error("failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize config
    #[error("failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// I/O error reading/writing config
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration value
    #[error("invalid config value for {field}: {reason}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Reason for invalidity
        reason: String,
    },
}

/// Result type alias using `BugfillError`.
pub type Result<T> = std::result::Result<T, BugfillError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BugfillError::Record("record has no field values".to_string());
        assert_eq!(
            err.to_string(),
            "invalid issue record: record has no field values"
        );

        let err = ConfigError::InvalidValue {
            field: "browser.debug_port".to_string(),
            reason: "must be non-zero".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid config value for browser.debug_port: must be non-zero"
        );
    }

    #[test]
    fn test_error_from_config() {
        let config_err = ConfigError::NoConfigDir;
        let err: BugfillError = config_err.into();
        assert!(matches!(err, BugfillError::Config(_)));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: BugfillError = io_err.into();
        assert!(matches!(err, BugfillError::Io(_)));
    }
}
