use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BrowserError>;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error(
        "browser executable not found (searched: {}). Install Chrome, or set \
         `browser.executable_path` in config.toml or BUGFILL_CHROME_PATH",
        display_paths(.searched)
    )]
    ExecutableNotFound { searched: Vec<PathBuf> },

    #[error(
        "debugging endpoint {endpoint} did not come up within {waited:?}. Close other \
         browser windows using the same profile, or check that port is free"
    )]
    DebugEndpointUnreachable { endpoint: String, waited: Duration },

    #[error("failed to launch browser {path}: {reason}")]
    LaunchFailed { path: PathBuf, reason: String },

    #[error("failed to attach to browser at {endpoint}: {reason}")]
    ConnectionFailed { endpoint: String, reason: String },

    #[error("chromium error: {0}")]
    ChromiumError(String),

    #[error("navigation failed: {0}")]
    NavigationError(String),

    #[error("selector not found: {0}")]
    SelectorNotFound(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("no active tab")]
    NoActiveTab,

    #[error("script failed on {locator}: {reason}")]
    Script { locator: String, reason: String },
}

impl From<chromiumoxide::error::CdpError> for BrowserError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        Self::ChromiumError(err.to_string())
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return "no candidate paths".to_string();
    }
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BrowserError::NavigationError("page not found".to_string());
        assert_eq!(err.to_string(), "navigation failed: page not found");
    }

    #[test]
    fn test_executable_not_found_lists_paths_and_remedy() {
        let err = BrowserError::ExecutableNotFound {
            searched: vec![
                PathBuf::from("/usr/bin/google-chrome"),
                PathBuf::from("/usr/bin/chromium"),
            ],
        };
        let message = err.to_string();
        assert!(message.contains("/usr/bin/google-chrome, /usr/bin/chromium"));
        assert!(message.contains("BUGFILL_CHROME_PATH"));
    }

    #[test]
    fn test_endpoint_unreachable_names_endpoint() {
        let err = BrowserError::DebugEndpointUnreachable {
            endpoint: "http://127.0.0.1:9222/json/version".to_string(),
            waited: Duration::from_secs(10),
        };
        assert!(err.to_string().contains("127.0.0.1:9222"));
    }
}
