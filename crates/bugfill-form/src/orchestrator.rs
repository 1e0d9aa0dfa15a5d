//! Walks the form schema for one issue record.
//!
//! The run stops short of submitting: the filled modal is left open for a
//! person to review. Only session and navigation failures abort; every
//! field-level failure is logged and the next step runs.

use crate::definition::{FieldDescriptor, FormSchema, FormStep, WidgetKind};
use crate::error::Result;
use crate::loader::schema_for;
use crate::navigation::Navigator;
use crate::splitter;
use crate::strategy::Injector;
use bugfill_browser::{BrowserActions, Locator};
use bugfill_core::{AppConfig, IssueRecord, TimingConfig};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

/// Per-issue tallies, logged when the form is done.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Tally {
    filled: usize,
    failed: usize,
    skipped: usize,
}

/// Fills the create-issue form from issue records.
#[derive(Debug, Clone)]
pub struct FormFiller {
    schema: FormSchema,
    timing: TimingConfig,
    dashboard_url: String,
}

impl FormFiller {
    #[must_use]
    pub fn new(schema: FormSchema, timing: TimingConfig, dashboard_url: impl Into<String>) -> Self {
        Self {
            schema,
            timing,
            dashboard_url: dashboard_url.into(),
        }
    }

    /// Filler for the configured target and timing.
    ///
    /// # Errors
    /// Returns error if a configured schema file can't be loaded.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let schema = schema_for(&config.target)?;
        Ok(Self::new(
            schema,
            config.timing.clone(),
            config.target.dashboard_url.clone(),
        ))
    }

    #[must_use]
    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    #[must_use]
    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    /// Open a create form in the active tab and fill it from `record`.
    ///
    /// # Errors
    /// Only fatal session or navigation failures; field-level failures
    /// surface as warning logs.
    pub async fn create_issue<D>(&self, driver: &D, record: &IssueRecord) -> Result<()>
    where
        D: BrowserActions + ?Sized,
    {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("create_issue", %run_id, summary = %record.summary());

        async move {
            let started = Instant::now();

            Navigator::new(driver, &self.timing)
                .open_create_form(&self.dashboard_url, &self.schema)
                .await?;

            let injector = Injector::new(driver, &self.timing);
            let mut tally = Tally::default();

            for step in &self.schema.steps {
                match step {
                    FormStep::Click { name, locator } => self.click_step(driver, name, locator).await,
                    FormStep::Fill(descriptor) => {
                        self.fill_step(&injector, descriptor, record, &mut tally).await;
                    }
                }
            }

            info!(
                elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                filled = tally.filled,
                failed = tally.failed,
                skipped = tally.skipped,
                "issue form filled, left open for review"
            );
            Ok(())
        }
        .instrument(span)
        .await
    }

    async fn click_step<D>(&self, driver: &D, name: &str, locator: &Locator)
    where
        D: BrowserActions + ?Sized,
    {
        let presence = Duration::from_millis(self.timing.presence_timeout_ms);
        let clicked = match driver.wait_for(locator, presence).await {
            Ok(()) => driver.click(locator).await,
            Err(e) => Err(e),
        };

        match clicked {
            Ok(()) => debug!(step = name, "clicked"),
            Err(e) => warn!(step = name, locator = %locator, error = %e, "click step failed, continuing"),
        }
    }

    async fn fill_step<D>(
        &self,
        injector: &Injector<'_, D>,
        descriptor: &FieldDescriptor,
        record: &IssueRecord,
        tally: &mut Tally,
    ) where
        D: BrowserActions + ?Sized,
    {
        let value = record.get(descriptor.key);
        let blank = value.trim().is_empty();

        if blank && descriptor.conditional {
            debug!(field = %descriptor.key, "no value, conditional step skipped");
            tally.skipped += 1;
            return;
        }

        if let Some(pause) = descriptor.settle_before {
            sleep(pause.duration(&self.timing)).await;
        }

        let values = match descriptor.widget {
            // The reviewer picker is committed even when left blank
            Some(WidgetKind::Autocomplete) => vec![value],
            Some(WidgetKind::Text | WidgetKind::RichText) if blank => Vec::new(),
            Some(WidgetKind::Text | WidgetKind::RichText) => vec![value],
            Some(WidgetKind::Combo) | None => splitter::values(value, descriptor.multiplicity),
        };

        if values.is_empty() {
            debug!(field = %descriptor.key, "no value, field left as is");
            tally.skipped += 1;
        }

        for token in values {
            let attempt = injector.fill(descriptor, token).await;
            attempt.log();
            if attempt.success() {
                tally.filled += 1;
            } else {
                tally.failed += 1;
            }
        }

        if let Some(pause) = descriptor.settle_after {
            sleep(pause.duration(&self.timing)).await;
        }
    }
}

async fn sleep(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}
