//! Dashboard navigation and opening the create-issue modal.

use crate::definition::FormSchema;
use crate::error::{FormError, Result};
use bugfill_browser::{BrowserActions, Locator};
use bugfill_core::TimingConfig;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct Navigator<'a, D: ?Sized> {
    driver: &'a D,
    timing: &'a TimingConfig,
}

impl<'a, D: BrowserActions + ?Sized> Navigator<'a, D> {
    pub fn new(driver: &'a D, timing: &'a TimingConfig) -> Self {
        Self { driver, timing }
    }

    /// Load the dashboard and open the create form.
    ///
    /// # Errors
    /// Navigation failures and a missing create trigger are fatal.
    pub async fn open_create_form(&self, dashboard_url: &str, schema: &FormSchema) -> Result<()> {
        self.driver.navigate(dashboard_url).await?;

        let ready_timeout = Duration::from_millis(self.timing.page_ready_timeout_ms);
        if let Err(e) = self.driver.wait_until_ready(ready_timeout).await {
            warn!(url = dashboard_url, error = %e, "dashboard did not finish loading, continuing");
        }

        let primary = &schema.create_button;
        let presence = Duration::from_millis(self.timing.presence_timeout_ms);
        match self.click_trigger(primary, presence).await {
            Ok(()) => debug!(trigger = %primary, "create trigger clicked"),
            Err(e) => {
                let Some(fallback) = &schema.create_button_fallback else {
                    return Err(FormError::CreateFormUnavailable {
                        primary: primary.to_string(),
                        fallback: None,
                    });
                };

                info!(trigger = %primary, error = %e, "create trigger not found, trying fallback");
                let short = Duration::from_millis(self.timing.fallback_trigger_timeout_ms);
                self.click_trigger(fallback, short).await.map_err(|_| {
                    FormError::CreateFormUnavailable {
                        primary: primary.to_string(),
                        fallback: Some(fallback.to_string()),
                    }
                })?;
                debug!(trigger = %fallback, "fallback create trigger clicked");
            }
        }

        if self.timing.create_form_settle_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.timing.create_form_settle_ms)).await;
        }
        Ok(())
    }

    async fn click_trigger(&self, trigger: &Locator, timeout: Duration) -> bugfill_browser::Result<()> {
        self.driver.wait_for(trigger, timeout).await?;
        self.driver.click(trigger).await
    }
}
