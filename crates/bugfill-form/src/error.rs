//! Error types for the form engine.

use bugfill_browser::BrowserError;
use thiserror::Error;

/// Errors that abort filling the current issue.
///
/// Field-level failures never surface here; they are logged and the
/// protocol moves on to the next field.
#[derive(Error, Debug)]
pub enum FormError {
    /// Neither create trigger could be clicked
    #[error(
        "could not open the create-issue form: trigger {primary} not found{}; \
         check that the dashboard loaded and the tracker session is logged in",
        fallback.as_ref().map(|f| format!(" and fallback {f} not found")).unwrap_or_default()
    )]
    CreateFormUnavailable {
        /// Primary trigger locator
        primary: String,
        /// Fallback trigger locator, when one is configured
        fallback: Option<String>,
    },

    /// Session-level browser failure
    #[error("browser error: {0}")]
    Browser(#[from] BrowserError),

    /// Failed to parse a form schema TOML
    #[error("failed to parse form schema TOML in {path}: {source}")]
    ParseError {
        /// Path to the schema file
        path: String,
        /// TOML parse error
        #[source]
        source: toml::de::Error,
    },

    /// Schema failed validation
    #[error("invalid form schema {schema}: {reason}")]
    ValidationError {
        /// Schema name
        schema: String,
        /// Reason for validation failure
        reason: String,
    },

    /// I/O error while reading a schema
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(#[from] bugfill_core::ConfigError),
}

/// Result type for form engine operations.
pub type Result<T> = std::result::Result<T, FormError>;
