//! Browser session management for the issue-form engine.
//!
//! Attaches to (or launches) one visible, debuggable browser so the tracker
//! login is reused across runs, and exposes the DOM actions the form engine
//! needs through the [`BrowserActions`] trait.

pub mod actions;
pub mod error;
pub mod manager;
pub mod session;

pub use actions::{BrowserActions, Key, Locator};
pub use error::{BrowserError, Result};
pub use manager::SessionManager;
pub use session::Session;
