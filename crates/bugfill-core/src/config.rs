//! Configuration management for bugfill.
//!
//! Provides TOML-based configuration with platform-standard paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Dashboard of the tracker instance the built-in form schema targets.
pub const DEFAULT_DASHBOARD_URL: &str = "https://jira.krafton.com/secure/Dashboard.jspa";

/// Main application configuration.
///
/// This is loaded from `~/.config/bugfill/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Browser process and debugging endpoint
    pub browser: BrowserConfig,
    /// Tracker instance and form schema
    pub target: TargetConfig,
    /// Waits and retry budgets of the fill engine
    pub timing: TimingConfig,
    /// Batch mode pacing
    pub batch: BatchConfig,
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from an explicit path, falling back to defaults if
    /// the file does not exist.
    pub fn load_from(config_path: &Path) -> ConfigResult<Self> {
        if config_path.exists() {
            tracing::debug!("Loading config from {}", config_path.display());
            let contents = fs::read_to_string(config_path)?;
            let config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `BUGFILL_CHROME_PATH`: browser executable to launch
    /// - `BUGFILL_DEBUG_PORT`: remote debugging port
    /// - `BUGFILL_DASHBOARD_URL`: tracker dashboard URL
    /// - `BUGFILL_SCHEMA_PATH`: TOML form schema replacing the built-in one
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Apply overrides from a variable lookup.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("BUGFILL_CHROME_PATH") {
            tracing::debug!("Override browser.executable_path from env: {}", path);
            self.browser.executable_path = Some(PathBuf::from(path));
        }

        if let Some(val) = lookup("BUGFILL_DEBUG_PORT") {
            if let Ok(port) = val.parse() {
                self.browser.debug_port = port;
                tracing::debug!("Override browser.debug_port from env: {}", port);
            }
        }

        if let Some(url) = lookup("BUGFILL_DASHBOARD_URL") {
            tracing::debug!("Override target.dashboard_url from env: {}", url);
            self.target.dashboard_url = url;
        }

        if let Some(path) = lookup("BUGFILL_SCHEMA_PATH") {
            tracing::debug!("Override target.schema_path from env: {}", path);
            self.target.schema_path = Some(PathBuf::from(path));
        }
    }

    /// Check values that would otherwise fail late, mid-run.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.browser.debug_port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "browser.debug_port".to_string(),
                reason: "must be non-zero".to_string(),
            });
        }

        url::Url::parse(&self.target.dashboard_url).map_err(|e| ConfigError::InvalidValue {
            field: "target.dashboard_url".to_string(),
            reason: e.to_string(),
        })?;

        if self.timing.dropdown_retry == 0 {
            return Err(ConfigError::InvalidValue {
                field: "timing.dropdown_retry".to_string(),
                reason: "at least one dropdown attempt is required".to_string(),
            });
        }

        Ok(())
    }

    /// Save configuration to the default config path.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> ConfigResult<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to `config_path`, creating parent directories.
    pub fn save_to(&self, config_path: &Path) -> ConfigResult<()> {
        if let Some(config_dir) = config_path.parent() {
            fs::create_dir_all(config_dir)?;
        }
        tracing::debug!("Saving config to {}", config_path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(config_path, contents)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> ConfigResult<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Get the data directory path.
    pub fn data_dir() -> ConfigResult<PathBuf> {
        Ok(Self::project_dirs()?.data_dir().to_path_buf())
    }

    fn project_dirs() -> ConfigResult<ProjectDirs> {
        ProjectDirs::from("com", "bugfill", "bugfill").ok_or(ConfigError::NoConfigDir)
    }
}

/// Browser process settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Explicit browser executable; known install paths are searched when unset
    pub executable_path: Option<PathBuf>,
    /// Local remote-debugging port
    pub debug_port: u16,
    /// Profile directory that keeps the tracker login across restarts
    pub user_data_dir: PathBuf,
    /// How long a freshly launched browser may take to open its endpoint
    pub startup_timeout_secs: u64,
}

impl BrowserConfig {
    /// Startup timeout as a `Duration`.
    #[must_use]
    pub fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.startup_timeout_secs)
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        let user_data_dir = AppConfig::data_dir()
            .map(|dir| dir.join("chrome-profile"))
            .unwrap_or_else(|_| std::env::temp_dir().join("bugfill-chrome-profile"));

        Self {
            executable_path: None,
            debug_port: 9222,
            user_data_dir,
            startup_timeout_secs: 10,
        }
    }
}

/// Tracker instance settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Dashboard page the create button lives on
    pub dashboard_url: String,
    /// TOML form schema replacing the built-in locators
    pub schema_path: Option<PathBuf>,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            dashboard_url: DEFAULT_DASHBOARD_URL.to_string(),
            schema_path: None,
        }
    }
}

/// Waits and retry budgets, all in milliseconds unless noted.
///
/// The defaults are tuned against the live form; the pauses after keystroke
/// injection give its autocomplete search time to populate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Bound on waiting for the dashboard to finish loading
    pub page_ready_timeout_ms: u64,
    /// Bound on waiting for a form field to appear
    pub presence_timeout_ms: u64,
    /// Per-attempt bound inside the dropdown cascade
    pub option_timeout_ms: u64,
    /// Interval between presence polls
    pub poll_interval_ms: u64,
    /// Short settle pause
    pub short_wait_ms: u64,
    /// Pause after keystrokes before committing
    pub medium_wait_ms: u64,
    /// Dropdown click attempts per value
    pub dropdown_retry: u32,
    /// Pause before clicking a dropdown open
    pub pre_click_delay_ms: u64,
    /// Pause for the option list to expand
    pub dropdown_open_delay_ms: u64,
    /// Pause between failed dropdown attempts
    pub retry_backoff_ms: u64,
    /// Pause between finding and clicking an option
    pub option_click_delay_ms: u64,
    /// Pause after opening the create form
    pub create_form_settle_ms: u64,
    /// Bound on waiting for the fallback create trigger
    pub fallback_trigger_timeout_ms: u64,
}

impl TimingConfig {
    /// Timing with every pause at zero, for driving mocks.
    #[must_use]
    pub fn immediate() -> Self {
        Self {
            page_ready_timeout_ms: 0,
            presence_timeout_ms: 0,
            option_timeout_ms: 0,
            poll_interval_ms: 0,
            short_wait_ms: 0,
            medium_wait_ms: 0,
            dropdown_retry: 3,
            pre_click_delay_ms: 0,
            dropdown_open_delay_ms: 0,
            retry_backoff_ms: 0,
            option_click_delay_ms: 0,
            create_form_settle_ms: 0,
            fallback_trigger_timeout_ms: 0,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            page_ready_timeout_ms: 10_000,
            presence_timeout_ms: 5_000,
            option_timeout_ms: 100,
            poll_interval_ms: 50,
            short_wait_ms: 500,
            medium_wait_ms: 1_500,
            dropdown_retry: 3,
            pre_click_delay_ms: 200,
            dropdown_open_delay_ms: 300,
            retry_backoff_ms: 300,
            option_click_delay_ms: 100,
            create_form_settle_ms: 1_000,
            fallback_trigger_timeout_ms: 1_000,
        }
    }
}

/// Batch mode pacing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Pause after opening a fresh tab
    pub new_tab_settle_ms: u64,
    /// Pause after each record so its widgets finish settling
    pub inter_record_pause_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            new_tab_settle_ms: 1_000,
            inter_record_pause_ms: 1_500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.browser.debug_port, 9222);
        assert_eq!(config.browser.startup_timeout(), Duration::from_secs(10));
        assert_eq!(config.target.dashboard_url, DEFAULT_DASHBOARD_URL);
        assert_eq!(config.timing.dropdown_retry, 3);
        assert!(config.timing.option_timeout_ms < 1_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("[browser]"));
        assert!(toml_str.contains("[timing]"));
        assert!(toml_str.contains("[batch]"));

        let parsed: AppConfig = toml::from_str(&toml_str).expect("parse serialized config");
        assert_eq!(parsed.timing, config.timing);
        assert_eq!(parsed.browser.user_data_dir, config.browser.user_data_dir);
    }

    #[test]
    fn test_load_from_missing_file_uses_defaults() {
        let tmp = TempDir::new().expect("create temp dir");
        let config = AppConfig::load_from(&tmp.path().join("absent.toml")).expect("load");
        assert_eq!(config.browser.debug_port, 9222);
    }

    #[test]
    fn test_save_to_creates_parent_dirs() {
        let tmp = TempDir::new().expect("create temp dir");
        let config_path = tmp.path().join("nested").join("bugfill.toml");

        let mut config = AppConfig::default();
        config.browser.debug_port = 9444;
        config.save_to(&config_path).expect("save config");

        let loaded = AppConfig::load_from(&config_path).expect("load config");
        assert_eq!(loaded.browser.debug_port, 9444);
    }

    #[test]
    fn test_load_from_file() {
        let tmp = TempDir::new().expect("create temp dir");
        let config_path = tmp.path().join("config.toml");
        fs::write(
            &config_path,
            r#"
[browser]
debug_port = 9333

[timing]
medium_wait_ms = 800
"#,
        )
        .expect("write config file");

        let config = AppConfig::load_from(&config_path).expect("load config");
        assert_eq!(config.browser.debug_port, 9333);
        assert_eq!(config.timing.medium_wait_ms, 800);
        // Untouched values keep their defaults
        assert_eq!(config.timing.dropdown_retry, 3);
        assert_eq!(config.batch.inter_record_pause_ms, 1_500);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("BUGFILL_CHROME_PATH", "/opt/chrome/chrome"),
            ("BUGFILL_DEBUG_PORT", "9444"),
            ("BUGFILL_DASHBOARD_URL", "https://tracker.example.com/"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_env_overrides(|name| env.get(name).map(ToString::to_string));

        assert_eq!(
            config.browser.executable_path,
            Some(PathBuf::from("/opt/chrome/chrome"))
        );
        assert_eq!(config.browser.debug_port, 9444);
        assert_eq!(config.target.dashboard_url, "https://tracker.example.com/");
        assert!(config.target.schema_path.is_none());
    }

    #[test]
    fn test_env_override_ignores_bad_port() {
        let mut config = AppConfig::default();
        config.apply_env_overrides(|name| {
            (name == "BUGFILL_DEBUG_PORT").then(|| "not-a-port".to_string())
        });
        assert_eq!(config.browser.debug_port, 9222);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.target.dashboard_url = "not a url".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "target.dashboard_url"
        ));

        let mut config = AppConfig::default();
        config.timing.dropdown_retry = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.browser.debug_port = 0;
        assert!(config.validate().is_err());
    }
}
