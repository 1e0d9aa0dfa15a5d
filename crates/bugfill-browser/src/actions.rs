use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Stable address of a DOM element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locator {
    /// XPath 1.0 expression
    XPath(String),
    /// CSS selector
    Css(String),
}

impl Locator {
    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::XPath(expr.into())
    }

    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// The raw expression, whatever its kind.
    #[must_use]
    pub fn expression(&self) -> &str {
        match self {
            Self::XPath(expr) | Self::Css(expr) => expr,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::XPath(expr) => write!(f, "xpath:{expr}"),
            Self::Css(selector) => write!(f, "css:{selector}"),
        }
    }
}

/// Non-printable keys the engine sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Tab,
    Escape,
}

impl Key {
    /// DevTools key name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Enter => "Enter",
            Self::Tab => "Tab",
            Self::Escape => "Escape",
        }
    }
}

/// DOM-level actions against the active tab.
///
/// Every element operation re-resolves its locator, so no element handle
/// outlives a single call and re-rendered nodes are picked up fresh.
#[async_trait::async_trait]
pub trait BrowserActions: Send + Sync {
    /// Navigate the active tab to a URL
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Wait until the document reports `complete`
    async fn wait_until_ready(&self, timeout: Duration) -> Result<()>;

    /// Poll until an element matching `locator` is present
    async fn wait_for(&self, locator: &Locator, timeout: Duration) -> Result<()>;

    /// Poll until an element matching `locator` is visible and enabled
    async fn wait_for_clickable(&self, locator: &Locator, timeout: Duration) -> Result<()>;

    /// Displayed text of an element
    async fn read_text(&self, locator: &Locator) -> Result<String>;

    /// Focus an element and type literal text into it
    async fn send_keys(&self, locator: &Locator, text: &str) -> Result<()>;

    /// Send a single key press to an element
    async fn press_key(&self, locator: &Locator, key: Key) -> Result<()>;

    /// Remove an element's current content
    async fn clear(&self, locator: &Locator) -> Result<()>;

    /// Native (mouse event) click
    async fn click(&self, locator: &Locator) -> Result<()>;

    /// Scripted `element.click()`, which ignores overlays
    async fn script_click(&self, locator: &Locator) -> Result<()>;

    /// Open a blank tab and make it active
    async fn new_tab(&self) -> Result<()>;

    /// Close the active tab and fall back to the first remaining one
    async fn close_current_tab(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locator_display() {
        assert_eq!(
            Locator::xpath("//*[@id=\"summary-field\"]").to_string(),
            "xpath://*[@id=\"summary-field\"]"
        );
        assert_eq!(Locator::css("#summary").to_string(), "css:#summary");
    }

    #[test]
    fn test_locator_toml_shape() {
        #[derive(Deserialize)]
        struct Holder {
            locator: Locator,
        }

        let holder: Holder =
            toml::from_str(r#"locator = { xpath = '//*[@id="labels-field"]' }"#)
                .expect("parse locator");
        assert_eq!(holder.locator, Locator::xpath(r#"//*[@id="labels-field"]"#));
    }

    #[test]
    fn test_key_names() {
        assert_eq!(Key::Enter.name(), "Enter");
        assert_eq!(Key::Escape.name(), "Escape");
    }
}
