//! Serial batch creation, one tab per record.

use crate::orchestrator::FormFiller;
use bugfill_browser::BrowserActions;
use bugfill_core::{BatchConfig, IssueRecord};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Characters of the summary shown in progress logs.
const SUMMARY_PREVIEW_CHARS: usize = 50;

/// A record whose form could not be filled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedRow {
    /// 1-based position in the input
    pub row: usize,
    pub summary: String,
    pub error: String,
}

/// Outcome of a batch run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub created: usize,
    /// Blank rows passed over without opening a form
    pub skipped: usize,
    pub failed: Vec<FailedRow>,
    /// Whether the run stopped at a record boundary on request
    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BatchSummary {
    /// Records left unprocessed by a cancellation.
    #[must_use]
    pub fn not_attempted(&self) -> usize {
        self.total - self.created - self.skipped - self.failed.len()
    }
}

/// Runs records through a form filler strictly one after another.
///
/// The browser session is left open afterwards so every filled tab can be
/// reviewed.
pub struct BatchRunner<'a> {
    filler: &'a FormFiller,
    config: &'a BatchConfig,
}

impl<'a> BatchRunner<'a> {
    pub fn new(filler: &'a FormFiller, config: &'a BatchConfig) -> Self {
        Self { filler, config }
    }

    /// Fill every non-blank record, each after the first in a fresh tab.
    ///
    /// `cancel` is honoured between records; a record in flight always runs
    /// to completion.
    pub async fn run<D>(
        &self,
        driver: &D,
        records: &[IssueRecord],
        cancel: &CancellationToken,
    ) -> BatchSummary
    where
        D: BrowserActions + ?Sized,
    {
        let started_at = Utc::now();
        let total = records.len();
        let mut created = 0;
        let mut skipped = 0;
        let mut attempted = 0;
        let mut failed = Vec::new();
        let mut cancelled = false;

        info!(total, "starting batch");

        for (index, record) in records.iter().enumerate() {
            let row = index + 1;
            if record.is_blank() {
                debug!(row, "blank row skipped");
                skipped += 1;
                continue;
            }

            if attempted > 0 {
                self.pause(self.config.inter_record_pause_ms, cancel).await;
            }
            if cancel.is_cancelled() {
                info!(row, "batch cancelled");
                cancelled = true;
                break;
            }

            let summary = preview(record.summary());
            info!(row, total, summary = %summary, "creating issue");

            attempted += 1;
            if attempted > 1 {
                if let Err(e) = driver.new_tab().await {
                    warn!(row, error = %e, "could not open a tab for the record");
                    failed.push(FailedRow {
                        row,
                        summary: record.summary().to_string(),
                        error: e.to_string(),
                    });
                    continue;
                }
                self.pause(self.config.new_tab_settle_ms, cancel).await;
            }

            match self.filler.create_issue(driver, record).await {
                Ok(()) => {
                    created += 1;
                    info!(row, total, summary = %summary, "issue form ready");
                }
                Err(e) => {
                    error!(row, summary = %summary, error = %e, "issue creation failed");
                    failed.push(FailedRow {
                        row,
                        summary: record.summary().to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        let summary = BatchSummary {
            total,
            created,
            skipped,
            failed,
            cancelled,
            started_at,
            finished_at: Utc::now(),
        };

        info!(
            total,
            created = summary.created,
            skipped = summary.skipped,
            failed = summary.failed.len(),
            cancelled = summary.cancelled,
            "batch finished"
        );
        summary
    }

    /// Sleep that ends early on cancellation.
    async fn pause(&self, millis: u64, cancel: &CancellationToken) {
        if millis == 0 {
            return;
        }
        tokio::select! {
            () = tokio::time::sleep(Duration::from_millis(millis)) => {}
            () = cancel.cancelled() => {}
        }
    }
}

fn preview(summary: &str) -> String {
    if summary.chars().count() > SUMMARY_PREVIEW_CHARS {
        let head: String = summary.chars().take(SUMMARY_PREVIEW_CHARS).collect();
        format!("{head}...")
    } else {
        summary.to_string()
    }
}
