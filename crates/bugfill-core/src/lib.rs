//! Bugfill Core - Foundation crate for the bugfill issue-form automation.
//!
//! This crate provides the issue record shape, error handling and
//! configuration management that the browser and form crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with platform paths and env overrides
//! - [`types`] - The `IssueRecord` and its `FieldKey` vocabulary
//!
//! # Example
//!
//! ```rust
//! use bugfill_core::{AppConfig, FieldKey, IssueRecord};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default();
//! config.validate()?;
//!
//! let record = IssueRecord::new()
//!     .with(FieldKey::Summary, "Client crashes on login")
//!     .with(FieldKey::Branch, "main qa");
//! assert_eq!(record.get(FieldKey::Parent), "");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{AppConfig, BatchConfig, BrowserConfig, TargetConfig, TimingConfig};
pub use error::{BugfillError, ConfigError, ConfigResult, Result};
pub use types::{FieldKey, IssueRecord};
