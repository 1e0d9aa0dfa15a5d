//! Issue-form engine.
//!
//! Opens the tracker's create-issue modal in a browser session and fills it
//! from an [`IssueRecord`](bugfill_core::IssueRecord), field by field,
//! following a [`FormSchema`]. Every value goes through a strategy cascade
//! tuned for widgets that behave differently on each load; a field that
//! cannot be filled is logged and skipped, and the form is never submitted.
//!
//! # Example
//!
//! ```no_run
//! use bugfill_core::{AppConfig, FieldKey, IssueRecord};
//! use bugfill_form::IssueAutomation;
//!
//! # async fn run() -> bugfill_form::Result<()> {
//! let config = AppConfig::load_with_env()?;
//! let mut automation = IssueAutomation::new(&config)?;
//!
//! let record = IssueRecord::new()
//!     .with(FieldKey::Summary, "Crash when opening inventory")
//!     .with(FieldKey::Label, "crash inventory");
//! automation.create_issue(&record).await?;
//! # Ok(())
//! # }
//! ```

pub mod automation;
pub mod batch;
pub mod definition;
pub mod error;
pub mod loader;
pub mod navigation;
pub mod options;
pub mod orchestrator;
pub mod resolver;
pub mod splitter;
pub mod strategy;

#[cfg(test)]
mod mock;

pub use automation::IssueAutomation;
pub use batch::{BatchRunner, BatchSummary, FailedRow};
pub use definition::{FieldDescriptor, FormSchema, FormStep, MatchMode, Multiplicity, Pause, WidgetKind};
pub use error::{FormError, Result};
pub use loader::{load_schema, parse_schema, schema_for};
pub use orchestrator::FormFiller;
pub use strategy::{FillAttempt, FillOutcome, StrategyKind};
