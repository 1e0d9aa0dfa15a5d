//! Value injection strategies.
//!
//! A cascade-driven value tries, in order:
//!
//! 1. direct keystrokes followed by Enter,
//! 2. opening the dropdown and clicking a matching option,
//!    retried up to `dropdown_retry` times,
//! 3. a last-resort clear and retype whose result is final.
//!
//! Keystroke success is optimistic: the form gives no reliable signal that
//! the typed value was accepted, so a call that raised no error counts as
//! filled. Every outcome is returned as a value and logged; nothing here
//! aborts the issue.

use crate::definition::{FieldDescriptor, WidgetKind};
use crate::options::option_locators;
use crate::resolver::{shows_value, FieldResolver};
use bugfill_browser::{BrowserActions, BrowserError, Key, Locator};
use bugfill_core::{FieldKey, TimingConfig};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Which strategy produced an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    /// Displayed value checked before any injection
    Precheck,
    /// Keystrokes followed by Enter
    DirectKeys,
    /// Open the list and click a matching option
    Dropdown,
    /// Clear and retype once
    LastResort,
    /// Keystrokes into a plain input
    RawText,
    /// Clear the editor, then type
    RichText,
    /// Type, then commit the suggestion with Enter
    Autocomplete,
}

impl StrategyKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Precheck => "precheck",
            Self::DirectKeys => "direct-keys",
            Self::Dropdown => "dropdown",
            Self::LastResort => "last-resort",
            Self::RawText => "raw-text",
            Self::RichText => "rich-text",
            Self::Autocomplete => "autocomplete",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a dropdown option was activated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionClick {
    /// Click dispatched from a script
    Script,
    /// Native mouse click
    Native,
    /// Enter pressed on the field
    Enter,
}

/// Result of one strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FillOutcome {
    /// Value injected
    Filled,
    /// Field already showed the value; nothing was injected
    AlreadySatisfied,
    /// The strategy gave up
    Failed { reason: String },
}

impl FillOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }

    fn failed(reason: impl fmt::Display) -> Self {
        Self::Failed {
            reason: reason.to_string(),
        }
    }
}

/// Record of filling one value, emitted to the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FillAttempt {
    pub key: FieldKey,
    pub value: String,
    /// Strategy whose outcome is final
    pub strategy: StrategyKind,
    pub outcome: FillOutcome,
    /// Dropdown attempts made
    pub retries: u32,
}

impl FillAttempt {
    #[must_use]
    pub fn success(&self) -> bool {
        self.outcome.is_success()
    }

    /// Emit the structured event for this attempt.
    pub fn log(&self) {
        match &self.outcome {
            FillOutcome::Filled => info!(
                field = %self.key,
                value = %self.value,
                strategy = %self.strategy,
                retries = self.retries,
                "field filled"
            ),
            FillOutcome::AlreadySatisfied => info!(
                field = %self.key,
                value = %self.value,
                strategy = %self.strategy,
                retries = self.retries,
                "field already set"
            ),
            FillOutcome::Failed { reason } => warn!(
                field = %self.key,
                value = %self.value,
                strategy = %self.strategy,
                retries = self.retries,
                reason = %reason,
                "field could not be filled"
            ),
        }
    }
}

/// Drives the strategies for one field value at a time.
pub struct Injector<'a, D: ?Sized> {
    driver: &'a D,
    timing: &'a TimingConfig,
    resolver: FieldResolver<'a, D>,
}

impl<'a, D: BrowserActions + ?Sized> Injector<'a, D> {
    pub fn new(driver: &'a D, timing: &'a TimingConfig) -> Self {
        Self {
            driver,
            timing,
            resolver: FieldResolver::new(driver, ms(timing.presence_timeout_ms)),
        }
    }

    /// Fill one value according to the descriptor's widget kind.
    ///
    /// A hinted strategy that fails on a non-blank value falls back to the
    /// full cascade, in case the hint no longer matches the widget.
    pub async fn fill(&self, descriptor: &FieldDescriptor, value: &str) -> FillAttempt {
        let hinted = self.fill_hinted(descriptor, value).await;
        if hinted.success() || value.trim().is_empty() || descriptor.uses_cascade() {
            return hinted;
        }

        debug!(
            field = %descriptor.key,
            strategy = %hinted.strategy,
            "hinted strategy failed, falling back to the cascade"
        );
        self.cascade(descriptor, value, true).await
    }

    async fn fill_hinted(&self, descriptor: &FieldDescriptor, value: &str) -> FillAttempt {
        let locator = &descriptor.locator;

        let (strategy, outcome) = match descriptor.widget {
            Some(WidgetKind::Text) => (StrategyKind::RawText, outcome(self.raw_text(locator, value).await)),
            Some(WidgetKind::RichText) => (
                StrategyKind::RichText,
                outcome(self.rich_text(locator, value).await),
            ),
            Some(WidgetKind::Autocomplete) => (
                StrategyKind::Autocomplete,
                outcome(self.autocomplete(locator, value).await),
            ),
            Some(WidgetKind::Combo) => return self.cascade(descriptor, value, false).await,
            None => return self.cascade(descriptor, value, true).await,
        };

        FillAttempt {
            key: descriptor.key,
            value: value.to_string(),
            strategy,
            outcome,
            retries: 0,
        }
    }

    /// Precheck, then keys (when enabled), dropdown and last resort.
    pub async fn cascade(
        &self,
        descriptor: &FieldDescriptor,
        value: &str,
        with_direct_keys: bool,
    ) -> FillAttempt {
        let attempt = |strategy, outcome, retries| FillAttempt {
            key: descriptor.key,
            value: value.to_string(),
            strategy,
            outcome,
            retries,
        };

        match self.resolver.already_satisfied(descriptor, value).await {
            Ok(true) => return attempt(StrategyKind::Precheck, FillOutcome::AlreadySatisfied, 0),
            Ok(false) => {}
            Err(e) => debug!(field = %descriptor.key, error = %e, "precheck could not read field"),
        }

        if with_direct_keys {
            match self.direct_keys(&descriptor.locator, value).await {
                Ok(()) => return attempt(StrategyKind::DirectKeys, FillOutcome::Filled, 0),
                Err(e) => debug!(
                    field = %descriptor.key,
                    value,
                    error = %e,
                    "direct keys failed, trying dropdown"
                ),
            }
        }

        let (dropdown, retries) = self.dropdown(descriptor, value).await;
        if dropdown.is_success() {
            return attempt(StrategyKind::Dropdown, dropdown, retries);
        }

        warn!(
            field = %descriptor.key,
            value,
            retries,
            "no dropdown option could be selected, retyping"
        );
        let last = outcome(self.last_resort(&descriptor.locator, value).await);
        attempt(StrategyKind::LastResort, last, retries)
    }

    /// Type the value, let the widget search, then commit with Enter.
    async fn direct_keys(&self, locator: &Locator, value: &str) -> Result<(), BrowserError> {
        self.resolver.wait_present(locator).await?;
        self.driver.send_keys(locator, value).await?;
        pause(self.timing.medium_wait_ms).await;
        self.driver.press_key(locator, Key::Enter).await
    }

    /// Up to `dropdown_retry` attempts at picking the option.
    async fn dropdown(&self, descriptor: &FieldDescriptor, value: &str) -> (FillOutcome, u32) {
        let budget = self.timing.dropdown_retry.max(1);
        let mut last_error = None;

        for attempt in 1..=budget {
            match self.dropdown_attempt(descriptor, value).await {
                Ok(Some(click)) => {
                    debug!(field = %descriptor.key, value, ?click, attempt, "option selected");
                    return (FillOutcome::Filled, attempt);
                }
                Ok(None) => return (FillOutcome::AlreadySatisfied, attempt),
                Err(e) => {
                    debug!(
                        field = %descriptor.key,
                        value,
                        attempt,
                        budget,
                        error = %e,
                        "dropdown attempt failed"
                    );
                    last_error = Some(e);
                    pause(self.timing.retry_backoff_ms).await;
                }
            }
        }

        let reason = last_error.map_or_else(|| "no attempts made".to_string(), |e| e.to_string());
        (FillOutcome::failed(reason), budget)
    }

    /// One dropdown attempt; `None` means the field already shows the value.
    async fn dropdown_attempt(
        &self,
        descriptor: &FieldDescriptor,
        value: &str,
    ) -> Result<Option<OptionClick>, BrowserError> {
        let field = &descriptor.locator;
        let option_timeout = ms(self.timing.option_timeout_ms);

        self.resolver.wait_present_within(field, option_timeout).await?;
        if shows_value(&self.driver.read_text(field).await?, value) {
            return Ok(None);
        }

        pause(self.timing.pre_click_delay_ms).await;
        self.driver.click(field).await?;
        pause(self.timing.dropdown_open_delay_ms).await;

        let option = self.find_option(value, descriptor, option_timeout).await?;
        pause(self.timing.option_click_delay_ms).await;

        if self.driver.script_click(&option).await.is_ok() {
            return Ok(Some(OptionClick::Script));
        }
        if self.driver.click(&option).await.is_ok() {
            return Ok(Some(OptionClick::Native));
        }
        self.driver.press_key(field, Key::Enter).await?;
        Ok(Some(OptionClick::Enter))
    }

    async fn find_option(
        &self,
        value: &str,
        descriptor: &FieldDescriptor,
        timeout: Duration,
    ) -> Result<Locator, BrowserError> {
        for candidate in option_locators(value, descriptor.match_mode) {
            if self.driver.wait_for_clickable(&candidate, timeout).await.is_ok() {
                return Ok(candidate);
            }
        }
        Err(BrowserError::SelectorNotFound(format!(
            "no option matching {value:?} for {}",
            descriptor.key
        )))
    }

    async fn last_resort(&self, locator: &Locator, value: &str) -> Result<(), BrowserError> {
        self.resolver.wait_present(locator).await?;
        self.driver.clear(locator).await?;
        pause(self.timing.option_click_delay_ms).await;
        self.driver.send_keys(locator, value).await?;
        pause(self.timing.medium_wait_ms).await;
        self.driver.press_key(locator, Key::Enter).await
    }

    async fn raw_text(&self, locator: &Locator, value: &str) -> Result<(), BrowserError> {
        self.resolver.wait_present(locator).await?;
        self.driver.send_keys(locator, value).await
    }

    async fn rich_text(&self, locator: &Locator, value: &str) -> Result<(), BrowserError> {
        self.resolver.wait_present(locator).await?;
        self.driver.clear(locator).await?;
        pause(self.timing.short_wait_ms).await;
        self.driver.send_keys(locator, value).await
    }

    /// Blank values still get the Enter commit.
    async fn autocomplete(&self, locator: &Locator, value: &str) -> Result<(), BrowserError> {
        self.resolver.wait_present(locator).await?;
        if !value.is_empty() {
            self.driver.send_keys(locator, value).await?;
        }
        pause(self.timing.medium_wait_ms).await;
        self.driver.press_key(locator, Key::Enter).await?;
        pause(self.timing.short_wait_ms).await;
        Ok(())
    }
}

fn outcome(result: Result<(), BrowserError>) -> FillOutcome {
    match result {
        Ok(()) => FillOutcome::Filled,
        Err(e) => FillOutcome::failed(e),
    }
}

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

async fn pause(millis: u64) {
    if millis > 0 {
        tokio::time::sleep(ms(millis)).await;
    }
}
