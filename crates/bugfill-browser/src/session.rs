use crate::actions::{BrowserActions, Key, Locator};
use crate::error::{BrowserError, Result};
use chromiumoxide::browser::Browser;
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use futures_util::stream::StreamExt;
use std::time::{Duration, Instant};
use tokio::process::Child;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// Empties inputs and textareas through their value setter so framework
/// listeners see the change; contenteditable editors are emptied in place.
const CLEAR_JS: &str = r"function() {
    this.focus();
    if ('value' in this) {
        const proto = this instanceof HTMLTextAreaElement
            ? HTMLTextAreaElement.prototype
            : HTMLInputElement.prototype;
        const setter = Object.getOwnPropertyDescriptor(proto, 'value');
        if (setter && setter.set) { setter.set.call(this, ''); } else { this.value = ''; }
        this.dispatchEvent(new Event('input', { bubbles: true }));
        this.dispatchEvent(new Event('change', { bubbles: true }));
    } else if (this.isContentEditable) {
        document.execCommand('selectAll', false, null);
        document.execCommand('delete', false, null);
    }
}";

const CLICKABLE_JS: &str = r"function() {
    const rect = this.getBoundingClientRect();
    const style = window.getComputedStyle(this);
    return rect.width > 0 && rect.height > 0
        && style.visibility !== 'hidden'
        && style.pointerEvents !== 'none'
        && !this.disabled;
}";

const SCRIPT_CLICK_JS: &str = "function() { this.click(); }";

/// One live browser automation handle plus its active tab.
///
/// Not meant for concurrent use: one task drives a session at a time.
pub struct Session {
    browser: Browser,
    active: RwLock<Option<Page>>,
    handler_task: JoinHandle<()>,
    /// Present when this process launched the browser itself
    child: Option<Child>,
    endpoint: String,
    poll_interval: Duration,
}

impl Session {
    /// Attach to a browser's DevTools websocket and open a fresh tab.
    pub(crate) async fn attach(
        ws_url: &str,
        endpoint: String,
        child: Option<Child>,
        poll_interval: Duration,
    ) -> Result<Self> {
        let (browser, mut handler) = Browser::connect(ws_url).await.map_err(|e| {
            BrowserError::ConnectionFailed {
                endpoint: endpoint.clone(),
                reason: e.to_string(),
            }
        })?;

        // Spawn browser handler
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("browser handler event error: {}", e);
                }
            }
            tracing::debug!("browser handler ended");
        });

        let session = Self {
            browser,
            active: RwLock::new(None),
            handler_task,
            child,
            endpoint,
            poll_interval,
        };
        session.new_tab().await?;

        tracing::info!(endpoint = %session.endpoint, "attached to browser");
        Ok(session)
    }

    /// DevTools endpoint this session is attached through.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Whether this process launched the browser.
    #[must_use]
    pub fn owns_process(&self) -> bool {
        self.child.is_some()
    }

    /// Close the browser and stop event handling.
    pub(crate) async fn shutdown(mut self) {
        if let Err(e) = self.browser.close().await {
            tracing::debug!("browser close returned: {}", e);
        }
        self.handler_task.abort();

        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill().await {
                tracing::debug!("browser process already gone: {}", e);
            }
        }
        tracing::info!(endpoint = %self.endpoint, "browser session closed");
    }

    async fn page(&self) -> Result<Page> {
        self.active.read().await.clone().ok_or(BrowserError::NoActiveTab)
    }

    async fn find(page: &Page, locator: &Locator) -> Result<Element> {
        let found = match locator {
            Locator::XPath(expr) => page.find_xpath(expr.as_str()).await,
            Locator::Css(selector) => page.find_element(selector.as_str()).await,
        };
        found.map_err(|_| BrowserError::SelectorNotFound(locator.to_string()))
    }

    /// Poll for an element; always makes at least one lookup.
    async fn resolve(&self, locator: &Locator, timeout: Duration) -> Result<Element> {
        let page = self.page().await?;
        let deadline = Instant::now() + timeout;

        loop {
            match Self::find(&page, locator).await {
                Ok(element) => return Ok(element),
                Err(e) if Instant::now() >= deadline => return Err(e),
                Err(_) => tokio::time::sleep(self.poll_interval).await,
            }
        }
    }

    /// Single lookup, used right before an interaction.
    async fn element(&self, locator: &Locator) -> Result<Element> {
        self.resolve(locator, Duration::ZERO).await
    }

    async fn call_js(
        element: &Element,
        locator: &Locator,
        function: &str,
    ) -> Result<Option<serde_json::Value>> {
        let returns = element
            .call_js_fn(function, false)
            .await
            .map_err(|e| BrowserError::Script {
                locator: locator.to_string(),
                reason: e.to_string(),
            })?;
        Ok(returns.result.value)
    }
}

#[async_trait::async_trait]
impl BrowserActions for Session {
    async fn navigate(&self, url: &str) -> Result<()> {
        let page = self.page().await?;
        page.goto(url)
            .await
            .map_err(|e| BrowserError::NavigationError(format!("{url}: {e}")))?;
        tracing::debug!(url, "navigated");
        Ok(())
    }

    async fn wait_until_ready(&self, timeout: Duration) -> Result<()> {
        let page = self.page().await?;
        let deadline = Instant::now() + timeout;

        loop {
            let state = page
                .evaluate("document.readyState")
                .await?
                .into_value::<String>()
                .unwrap_or_default();
            if state == "complete" {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(BrowserError::Timeout(format!(
                    "document still '{state}' after {timeout:?}"
                )));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn wait_for(&self, locator: &Locator, timeout: Duration) -> Result<()> {
        self.resolve(locator, timeout).await.map(|_| ())
    }

    async fn wait_for_clickable(&self, locator: &Locator, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let element = self.resolve(locator, remaining).await?;
            let clickable = Self::call_js(&element, locator, CLICKABLE_JS)
                .await?
                .and_then(|v| v.as_bool())
                .unwrap_or(false);
            if clickable {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(BrowserError::Timeout(format!(
                    "{locator} not clickable after {timeout:?}"
                )));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn read_text(&self, locator: &Locator) -> Result<String> {
        let element = self.element(locator).await?;
        Ok(element.inner_text().await?.unwrap_or_default())
    }

    async fn send_keys(&self, locator: &Locator, text: &str) -> Result<()> {
        let element = self.element(locator).await?;
        element.focus().await?;
        element.type_str(text).await?;
        Ok(())
    }

    async fn press_key(&self, locator: &Locator, key: Key) -> Result<()> {
        let element = self.element(locator).await?;
        element.focus().await?;
        element.press_key(key.name()).await?;
        Ok(())
    }

    async fn clear(&self, locator: &Locator) -> Result<()> {
        let element = self.element(locator).await?;
        Self::call_js(&element, locator, CLEAR_JS).await?;
        Ok(())
    }

    async fn click(&self, locator: &Locator) -> Result<()> {
        let element = self.element(locator).await?;
        element.click().await?;
        Ok(())
    }

    async fn script_click(&self, locator: &Locator) -> Result<()> {
        let element = self.element(locator).await?;
        Self::call_js(&element, locator, SCRIPT_CLICK_JS).await?;
        Ok(())
    }

    async fn new_tab(&self) -> Result<()> {
        let page = self.browser.new_page("about:blank").await?;
        page.bring_to_front().await?;
        *self.active.write().await = Some(page);
        tracing::debug!("opened new tab");
        Ok(())
    }

    async fn close_current_tab(&self) -> Result<()> {
        let Some(page) = self.active.read().await.clone() else {
            return Ok(());
        };
        page.close().await?;
        *self.active.write().await = None;

        // Stale targets can linger in the page list right after a close
        for page in self.browser.pages().await? {
            match page.bring_to_front().await {
                Ok(_) => {
                    *self.active.write().await = Some(page);
                    tracing::debug!("closed tab, switched to a remaining tab");
                    return Ok(());
                }
                Err(e) => tracing::debug!(error = %e, "skipping tab that could not be focused"),
            }
        }
        tracing::warn!("closed the last tab; session has no active tab");
        Ok(())
    }
}
