//! Field presence and current-value checks.

use crate::definition::FieldDescriptor;
use bugfill_browser::{BrowserActions, Locator, Result};
use std::time::Duration;

/// Locates form fields and reads what they currently show.
pub struct FieldResolver<'a, D: ?Sized> {
    driver: &'a D,
    presence_timeout: Duration,
}

impl<'a, D: BrowserActions + ?Sized> FieldResolver<'a, D> {
    pub fn new(driver: &'a D, presence_timeout: Duration) -> Self {
        Self {
            driver,
            presence_timeout,
        }
    }

    /// Wait up to the presence timeout for `locator`.
    pub async fn wait_present(&self, locator: &Locator) -> Result<()> {
        self.driver.wait_for(locator, self.presence_timeout).await
    }

    /// Wait up to `timeout` for `locator`.
    pub async fn wait_present_within(&self, locator: &Locator, timeout: Duration) -> Result<()> {
        self.driver.wait_for(locator, timeout).await
    }

    /// Whether the field already displays `value`.
    ///
    /// Reads the displayed text only; never types, clicks or clears.
    pub async fn already_satisfied(&self, descriptor: &FieldDescriptor, value: &str) -> Result<bool> {
        self.wait_present(&descriptor.locator).await?;
        let shown = self.driver.read_text(&descriptor.locator).await?;
        Ok(shows_value(&shown, value))
    }
}

/// Case- and whitespace-insensitive comparison of displayed text to a value.
#[must_use]
pub fn shows_value(displayed: &str, value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && displayed.trim().to_lowercase() == value.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{Call, MockDriver};
    use bugfill_core::FieldKey;

    #[test]
    fn test_shows_value() {
        assert!(shows_value("  Game QA \n", "game qa"));
        assert!(shows_value("High", "HIGH"));
        assert!(!shows_value("High", "Highest"));
        assert!(!shows_value("", ""));
    }

    #[tokio::test]
    async fn test_already_satisfied_only_reads() {
        let locator = Locator::css("#priority-field");
        let driver = MockDriver::new().with_text(&locator, "High");
        let resolver = FieldResolver::new(&driver, Duration::ZERO);
        let descriptor = FieldDescriptor::new(FieldKey::Priority, locator.clone());

        assert!(resolver
            .already_satisfied(&descriptor, "high")
            .await
            .expect("check field"));
        assert!(!resolver
            .already_satisfied(&descriptor, "low")
            .await
            .expect("check field"));

        assert_eq!(driver.injections_on(&locator), 0);
        assert!(driver.calls().contains(&Call::ReadText(locator)));
    }

    #[tokio::test]
    async fn test_missing_field_is_an_error() {
        let locator = Locator::css("#severity-field");
        let driver = MockDriver::new().missing(&locator);
        let resolver = FieldResolver::new(&driver, Duration::ZERO);
        let descriptor = FieldDescriptor::new(FieldKey::Severity, locator);

        assert!(resolver.already_satisfied(&descriptor, "major").await.is_err());
    }
}
