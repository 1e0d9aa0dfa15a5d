//! Recording `BrowserActions` implementation for tests.

use async_trait::async_trait;
use bugfill_browser::{BrowserActions, BrowserError, Key, Locator, Result};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// One recorded interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Navigate(String),
    WaitReady,
    WaitFor(Locator),
    WaitClickable(Locator),
    ReadText(Locator),
    SendKeys(Locator, String),
    PressKey(Locator, Key),
    Clear(Locator),
    Click(Locator),
    ScriptClick(Locator),
    NewTab,
    CloseTab,
}

impl Call {
    pub fn locator(&self) -> Option<&Locator> {
        match self {
            Self::WaitFor(l)
            | Self::WaitClickable(l)
            | Self::ReadText(l)
            | Self::SendKeys(l, _)
            | Self::PressKey(l, _)
            | Self::Clear(l)
            | Self::Click(l)
            | Self::ScriptClick(l) => Some(l),
            Self::Navigate(_) | Self::WaitReady | Self::NewTab | Self::CloseTab => None,
        }
    }

    /// Whether the call changes what a field holds.
    pub fn is_injection(&self) -> bool {
        matches!(
            self,
            Self::SendKeys(..) | Self::PressKey(..) | Self::Clear(_) | Self::Click(_) | Self::ScriptClick(_)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Navigate,
    WaitReady,
    WaitFor,
    WaitClickable,
    ReadText,
    SendKeys,
    PressKey,
    Clear,
    Click,
    ScriptClick,
    NewTab,
}

struct Rule {
    op: Op,
    locator: Option<Locator>,
    skip: usize,
    remaining: Option<usize>,
}

/// Browser stand-in that records every call and fails on demand.
///
/// Unknown elements are present, clickable and show empty text.
#[derive(Default)]
pub struct MockDriver {
    calls: Mutex<Vec<Call>>,
    rules: Mutex<Vec<Rule>>,
    texts: Mutex<HashMap<Locator, String>>,
    cancel_after: Mutex<Option<(CancellationToken, usize)>>,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Displayed text of an element.
    pub fn with_text(self, locator: &Locator, text: &str) -> Self {
        self.texts
            .lock()
            .unwrap()
            .insert(locator.clone(), text.to_string());
        self
    }

    /// `op` on `locator` always fails.
    pub fn failing(self, op: Op, locator: &Locator) -> Self {
        self.rule(op, Some(locator.clone()), 0, None)
    }

    /// `op` on `locator` fails for its first `times` calls.
    pub fn failing_times(self, op: Op, locator: &Locator, times: usize) -> Self {
        self.rule(op, Some(locator.clone()), 0, Some(times))
    }

    /// `op` always fails, whatever it targets.
    pub fn failing_any(self, op: Op) -> Self {
        self.rule(op, None, 0, None)
    }

    /// Only the `nth` call (1-based) of `op` fails.
    pub fn failing_nth(self, op: Op, nth: usize) -> Self {
        self.rule(op, None, nth.saturating_sub(1), Some(1))
    }

    /// Every operation on `locator` fails, as if it were not in the DOM.
    pub fn missing(self, locator: &Locator) -> Self {
        [
            Op::WaitFor,
            Op::WaitClickable,
            Op::ReadText,
            Op::SendKeys,
            Op::PressKey,
            Op::Clear,
            Op::Click,
            Op::ScriptClick,
        ]
        .into_iter()
        .fold(self, |mock, op| mock.failing(op, locator))
    }

    /// Cancel `token` once `navigations` navigations have happened.
    pub fn cancelling_after(self, token: CancellationToken, navigations: usize) -> Self {
        *self.cancel_after.lock().unwrap() = Some((token, navigations));
        self
    }

    fn rule(self, op: Op, locator: Option<Locator>, skip: usize, remaining: Option<usize>) -> Self {
        self.rules.lock().unwrap().push(Rule {
            op,
            locator,
            skip,
            remaining,
        });
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_on(&self, locator: &Locator) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| call.locator() == Some(locator))
            .collect()
    }

    pub fn injections_on(&self, locator: &Locator) -> usize {
        self.calls_on(locator)
            .iter()
            .filter(|call| call.is_injection())
            .count()
    }

    /// Text typed anywhere, in order.
    pub fn typed(&self) -> Vec<(Locator, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::SendKeys(locator, text) => Some((locator, text)),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, wanted: &Call) -> usize {
        self.calls().iter().filter(|call| *call == wanted).count()
    }

    fn record(&self, op: Op, call: Call) -> Result<()> {
        let locator = call.locator().cloned();
        self.calls.lock().unwrap().push(call);

        let mut rules = self.rules.lock().unwrap();
        for rule in rules.iter_mut() {
            if rule.op != op {
                continue;
            }
            if rule.locator.is_some() && rule.locator != locator {
                continue;
            }
            if rule.skip > 0 {
                rule.skip -= 1;
                continue;
            }
            match rule.remaining.as_mut() {
                Some(0) => continue,
                Some(n) => *n -= 1,
                None => {}
            }
            return Err(match (op, locator) {
                (Op::Navigate, _) => BrowserError::NavigationError("mock navigation failure".into()),
                (Op::NewTab, _) => BrowserError::NoActiveTab,
                (_, Some(locator)) => BrowserError::SelectorNotFound(locator.to_string()),
                (_, None) => BrowserError::Timeout("mock timeout".into()),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl BrowserActions for MockDriver {
    async fn navigate(&self, url: &str) -> Result<()> {
        let result = self.record(Op::Navigate, Call::Navigate(url.to_string()));

        let navigations = self
            .calls()
            .iter()
            .filter(|call| matches!(call, Call::Navigate(_)))
            .count();
        if let Some((token, after)) = self.cancel_after.lock().unwrap().as_ref() {
            if navigations >= *after {
                token.cancel();
            }
        }

        result
    }

    async fn wait_until_ready(&self, _timeout: Duration) -> Result<()> {
        self.record(Op::WaitReady, Call::WaitReady)
    }

    async fn wait_for(&self, locator: &Locator, _timeout: Duration) -> Result<()> {
        self.record(Op::WaitFor, Call::WaitFor(locator.clone()))
    }

    async fn wait_for_clickable(&self, locator: &Locator, _timeout: Duration) -> Result<()> {
        self.record(Op::WaitClickable, Call::WaitClickable(locator.clone()))
    }

    async fn read_text(&self, locator: &Locator) -> Result<String> {
        self.record(Op::ReadText, Call::ReadText(locator.clone()))?;
        Ok(self
            .texts
            .lock()
            .unwrap()
            .get(locator)
            .cloned()
            .unwrap_or_default())
    }

    async fn send_keys(&self, locator: &Locator, text: &str) -> Result<()> {
        self.record(Op::SendKeys, Call::SendKeys(locator.clone(), text.to_string()))
    }

    async fn press_key(&self, locator: &Locator, key: Key) -> Result<()> {
        self.record(Op::PressKey, Call::PressKey(locator.clone(), key))
    }

    async fn clear(&self, locator: &Locator) -> Result<()> {
        self.record(Op::Clear, Call::Clear(locator.clone()))
    }

    async fn click(&self, locator: &Locator) -> Result<()> {
        self.record(Op::Click, Call::Click(locator.clone()))
    }

    async fn script_click(&self, locator: &Locator) -> Result<()> {
        self.record(Op::ScriptClick, Call::ScriptClick(locator.clone()))
    }

    async fn new_tab(&self) -> Result<()> {
        self.record(Op::NewTab, Call::NewTab)
    }

    async fn close_current_tab(&self) -> Result<()> {
        self.calls.lock().unwrap().push(Call::CloseTab);
        Ok(())
    }
}

/// Captures formatted log output for assertions.
pub fn capture_logs() -> (tracing::subscriber::DefaultGuard, std::sync::Arc<Mutex<Vec<u8>>>) {
    use std::sync::Arc;

    let buffer = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&buffer);
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(move || LogWriter(Arc::clone(&sink)))
        .finish();

    (tracing::subscriber::set_default(subscriber), buffer)
}

pub fn logged(buffer: &Mutex<Vec<u8>>) -> String {
    String::from_utf8_lossy(&buffer.lock().unwrap()).into_owned()
}

struct LogWriter(std::sync::Arc<Mutex<Vec<u8>>>);

impl std::io::Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
