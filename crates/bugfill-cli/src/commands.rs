use crate::cli::{BatchArgs, ConfigArgs, CreateArgs};
use anyhow::{bail, Context, Result};
use bugfill_browser::SessionManager;
use bugfill_core::{AppConfig, IssueRecord};
use bugfill_form::{schema_for, BatchSummary, IssueAutomation};
use std::path::{Path, PathBuf};
use tokio::io::AsyncBufReadExt;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Config file (or defaults), then environment overrides, then validation.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let mut config = match path {
        Some(path) => AppConfig::load_from(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => AppConfig::load().context("failed to load config")?,
    };
    config.apply_env_overrides(|name| std::env::var(name).ok());
    config.validate().context("invalid configuration")?;
    Ok(config)
}

pub fn read_record(path: &Path) -> Result<IssueRecord> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let record: IssueRecord = serde_json::from_str(&contents)
        .with_context(|| format!("{} is not a valid issue record", path.display()))?;
    record
        .validate()
        .with_context(|| format!("{} has nothing to fill", path.display()))?;
    Ok(record)
}

pub fn read_records(path: &Path) -> Result<Vec<IssueRecord>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("{} is not a JSON array of issue records", path.display()))
}

pub async fn create(config: &AppConfig, args: &CreateArgs) -> Result<()> {
    let record = read_record(&args.record)?;
    let mut automation = IssueAutomation::new(config)?;

    automation
        .create_issue(&record)
        .await
        .context("could not fill the create-issue form")?;

    println!(
        "Form filled for \"{}\". Review and submit it in the browser.",
        record.summary()
    );

    if !args.no_wait {
        println!("Press Enter to exit.");
        let mut line = String::new();
        tokio::io::BufReader::new(tokio::io::stdin())
            .read_line(&mut line)
            .await
            .context("failed to read from stdin")?;
    }
    Ok(())
}

pub async fn batch(config: &AppConfig, args: &BatchArgs) -> Result<()> {
    let records = read_records(&args.records)?;
    if records.is_empty() {
        bail!("{} holds no records", args.records.display());
    }

    let mut automation = IssueAutomation::new(config)?;
    let cancel = CancellationToken::new();

    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("cancel requested, stopping after the current record");
                cancel.cancel();
            }
        })
    };

    let summary = automation.run_batch(&records, &cancel).await;
    watcher.abort();
    let summary = summary.context("could not start the browser session")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", render_summary(&summary));
    }
    Ok(())
}

pub async fn close(config: &AppConfig) -> Result<()> {
    let mut sessions = SessionManager::new(config.browser.clone());

    if !sessions.is_running().await {
        println!("No debugging browser on port {}.", config.browser.debug_port);
        return Ok(());
    }

    sessions
        .ensure_session()
        .await
        .context("failed to attach to the debugging browser")?;
    sessions.close().await;
    println!("Browser closed.");
    Ok(())
}

pub fn schema(config: &AppConfig) -> Result<()> {
    let schema = schema_for(&config.target)?;
    print!("{}", toml::to_string_pretty(&schema)?);
    Ok(())
}

pub fn show_config(config: &AppConfig, path: Option<&Path>, args: &ConfigArgs) -> Result<()> {
    let path = config_file(path)?;

    if args.init {
        if init_config(&path)? {
            println!("# wrote defaults to {}", path.display());
        } else {
            println!("# {} already exists, left unchanged", path.display());
        }
    }

    println!("# {}", path.display());
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

/// The file `load_config` reads for this invocation.
fn config_file(path: Option<&Path>) -> Result<PathBuf> {
    match path {
        Some(path) => Ok(path.to_path_buf()),
        None => AppConfig::config_path().context("could not determine the config path"),
    }
}

/// Write the defaults to `path` unless a file is already there.
fn init_config(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    AppConfig::default()
        .save_to(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(true)
}

fn render_summary(summary: &BatchSummary) -> String {
    let mut out = format!(
        "Filled {} of {} issue forms in {}s.\n",
        summary.created,
        summary.total,
        (summary.finished_at - summary.started_at).num_seconds()
    );

    if summary.skipped > 0 {
        out.push_str(&format!("Skipped {} blank rows.\n", summary.skipped));
    }

    if summary.cancelled {
        out.push_str(&format!(
            "Cancelled; {} records were not attempted.\n",
            summary.not_attempted()
        ));
    }

    for row in &summary.failed {
        out.push_str(&format!("  row {}: {} ({})\n", row.row, row.summary, row.error));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use bugfill_core::FieldKey;
    use bugfill_form::FailedRow;
    use tempfile::TempDir;

    #[test]
    fn test_read_record_accepts_spreadsheet_headers() {
        let tmp = TempDir::new().expect("create temp dir");
        let path = tmp.path().join("issue.json");
        std::fs::write(
            &path,
            r#"{"Summary": "Crash on boot", "Fix Version": "1.2 1.3", "Repro Rate": 100}"#,
        )
        .expect("write record");

        let record = read_record(&path).expect("read record");
        assert_eq!(record.summary(), "Crash on boot");
        assert_eq!(record.get(FieldKey::FixVersion), "1.2 1.3");
        assert_eq!(record.get(FieldKey::ReproRate), "100");
    }

    #[test]
    fn test_read_records_requires_array() {
        let tmp = TempDir::new().expect("create temp dir");
        let path = tmp.path().join("rows.json");
        std::fs::write(&path, r#"{"summary": "not an array"}"#).expect("write rows");

        let err = read_records(&path).expect_err("object is not a batch");
        assert!(err.to_string().contains("JSON array"));
    }

    #[test]
    fn test_blank_record_is_rejected() {
        let tmp = TempDir::new().expect("create temp dir");
        let path = tmp.path().join("issue.json");
        std::fs::write(&path, r#"{"summary": "  ", "priority": null}"#).expect("write record");

        let err = read_record(&path).expect_err("nothing to fill");
        assert!(err.to_string().contains("nothing to fill"));
    }

    #[test]
    fn test_init_writes_to_explicit_config_path() {
        let tmp = TempDir::new().expect("create temp dir");
        let path = tmp.path().join("mine.toml");

        assert_eq!(config_file(Some(&path)).expect("config file"), path);
        assert!(init_config(&path).expect("init config"));
        assert!(path.exists());

        let config = load_config(Some(&path)).expect("load config");
        assert_eq!(config.browser.debug_port, 9222);
    }

    #[test]
    fn test_init_leaves_existing_config_alone() {
        let tmp = TempDir::new().expect("create temp dir");
        let path = tmp.path().join("mine.toml");
        std::fs::write(&path, "[browser]\ndebug_port = 9444\n").expect("write config");

        assert!(!init_config(&path).expect("init config"));
        let config = load_config(Some(&path)).expect("load config");
        assert_eq!(config.browser.debug_port, 9444);
    }

    #[test]
    fn test_load_config_from_explicit_path() {
        let tmp = TempDir::new().expect("create temp dir");
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[timing]\ndropdown_retry = 5\n").expect("write config");

        let config = load_config(Some(&path)).expect("load config");
        assert_eq!(config.timing.dropdown_retry, 5);
    }

    #[test]
    fn test_load_config_rejects_invalid_values() {
        let tmp = TempDir::new().expect("create temp dir");
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[timing]\ndropdown_retry = 0\n").expect("write config");

        assert!(load_config(Some(&path)).is_err());
    }

    #[test]
    fn test_render_summary_lists_failures() {
        let now = chrono::Utc::now();
        let summary = BatchSummary {
            total: 4,
            created: 1,
            skipped: 1,
            failed: vec![FailedRow {
                row: 2,
                summary: "Broken row".to_string(),
                error: "navigation failed".to_string(),
            }],
            cancelled: true,
            started_at: now,
            finished_at: now,
        };

        let text = render_summary(&summary);
        assert!(text.starts_with("Filled 1 of 4 issue forms"));
        assert!(text.contains("Skipped 1 blank rows"));
        assert!(text.contains("1 records were not attempted"));
        assert!(text.contains("row 2: Broken row (navigation failed)"));
    }
}
