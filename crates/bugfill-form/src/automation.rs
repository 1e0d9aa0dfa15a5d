//! Session-owning entry point for callers.

use crate::batch::{BatchRunner, BatchSummary};
use crate::definition::FormSchema;
use crate::error::Result;
use crate::orchestrator::FormFiller;
use bugfill_browser::SessionManager;
use bugfill_core::{AppConfig, BatchConfig, IssueRecord};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// One browser session plus the form protocol to drive through it.
///
/// The session is created lazily by the first issue and kept until
/// [`IssueAutomation::close`].
pub struct IssueAutomation {
    sessions: SessionManager,
    filler: FormFiller,
    batch: BatchConfig,
}

impl IssueAutomation {
    /// Automation for the configured browser, target and schema.
    ///
    /// # Errors
    /// Returns error if a configured schema file can't be loaded.
    pub fn new(config: &AppConfig) -> Result<Self> {
        let filler = FormFiller::from_config(config)?;
        Ok(Self::with_filler(config, filler))
    }

    /// Automation driving `schema` instead of the configured one.
    #[must_use]
    pub fn with_schema(config: &AppConfig, schema: FormSchema) -> Self {
        let filler = FormFiller::new(
            schema,
            config.timing.clone(),
            config.target.dashboard_url.clone(),
        );
        Self::with_filler(config, filler)
    }

    fn with_filler(config: &AppConfig, filler: FormFiller) -> Self {
        let sessions = SessionManager::new(config.browser.clone())
            .with_poll_interval(Duration::from_millis(config.timing.poll_interval_ms));
        Self {
            sessions,
            filler,
            batch: config.batch.clone(),
        }
    }

    #[must_use]
    pub fn filler(&self) -> &FormFiller {
        &self.filler
    }

    /// Fill one create-issue form in the active tab.
    ///
    /// # Errors
    /// Session startup, navigation and create-form failures.
    pub async fn create_issue(&mut self, record: &IssueRecord) -> Result<()> {
        let session = self.sessions.ensure_session().await?;
        self.filler.create_issue(session, record).await
    }

    /// Fill one form per record, each after the first in its own tab.
    ///
    /// # Errors
    /// Only session startup; per-record failures land in the summary.
    pub async fn run_batch(
        &mut self,
        records: &[IssueRecord],
        cancel: &CancellationToken,
    ) -> Result<BatchSummary> {
        let session = self.sessions.ensure_session().await?;
        Ok(BatchRunner::new(&self.filler, &self.batch)
            .run(session, records, cancel)
            .await)
    }

    /// Close the whole browser. No-op when no session was started.
    pub async fn close(&mut self) {
        self.sessions.close().await;
    }
}
