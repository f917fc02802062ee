//! Observability: tracing init and the bootstrap audit log.
//!
//! Uses config::ObservabilityConfig for INTENTBOT_QUIET, LOG_LEVEL, LOG_JSON, AUDIT_LOG.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use chrono::Utc;
use intentbot_env::{BootstrapReport, StepRecord};
use serde_json::json;
use tracing_subscriber::{prelude::*, EnvFilter};

use crate::config::ObservabilityConfig;

/// Initialize tracing. Call at process startup.
/// When INTENTBOT_QUIET=1, only WARN and above are logged.
pub fn init_tracing() {
    let cfg = ObservabilityConfig::from_env();
    let level = if cfg.quiet {
        "intentbot=warn,intentbot_env=warn,intentbot_core=warn".to_string()
    } else {
        cfg.log_level.clone()
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));

    let _ = if cfg.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };
}

fn audit_path() -> Option<String> {
    let path = ObservabilityConfig::from_env().audit_log.clone()?;
    if let Some(parent) = Path::new(&path).parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    Some(path)
}

fn append_jsonl(path: &str, record: &serde_json::Value) {
    if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(path) {
        if let Ok(line) = serde_json::to_string(record) {
            let _ = writeln!(f, "{}", line);
        }
    }
}

fn step_record(record: &StepRecord) -> serde_json::Value {
    json!({
        "ts": Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        "event": "step_completed",
        "step": record.step.as_str(),
        "status": record.status.as_str(),
        "detail": record.status.detail(),
        "duration_ms": record.duration.as_millis() as u64,
    })
}

fn summary_record(report: &BootstrapReport) -> serde_json::Value {
    let masked: Vec<&str> = report.masked_failures().iter().map(|r| r.step.as_str()).collect();
    json!({
        "ts": Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        "event": "bootstrap_finished",
        "stage": report.stage.as_str(),
        "aborted": report.aborted_at.is_some(),
        "aborted_at": report.aborted_at.map(|s| s.as_str()),
        "masked_steps": masked,
        "launch_to_browser_ms": report.launch_to_browser.map(|d| d.as_millis() as u64),
    })
}

/// Audit: one `step_completed` line per step plus a `bootstrap_finished` summary.
pub fn audit_bootstrap(report: &BootstrapReport) {
    if let Some(path) = audit_path() {
        for step in &report.steps {
            append_jsonl(&path, &step_record(step));
        }
        append_jsonl(&path, &summary_record(report));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use intentbot_env::{Step, StepStatus};
    use std::time::Duration;

    #[test]
    fn test_step_record_fields() {
        let record = StepRecord {
            step: Step::Install,
            status: StepStatus::Failed("`python -m pip install flask` failed: exit code 1".to_string()),
            duration: Duration::from_millis(1500),
        };
        let v = step_record(&record);
        assert_eq!(v["event"], "step_completed");
        assert_eq!(v["step"], "install");
        assert_eq!(v["status"], "failed");
        assert_eq!(v["duration_ms"], 1500);
    }

    #[test]
    fn test_summary_record_separates_abort_from_masked() {
        let report = BootstrapReport {
            stage: intentbot_env::Stage::EnvironmentReady,
            steps: vec![StepRecord {
                step: Step::Install,
                status: StepStatus::Failed("pip not found".to_string()),
                duration: Duration::from_millis(3),
            }],
            app: None,
            launch_to_browser: None,
            aborted_at: Some(Step::Install),
        };
        let v = summary_record(&report);
        assert_eq!(v["aborted"], true);
        assert_eq!(v["aborted_at"], "install");
        assert_eq!(v["masked_steps"], json!([]));
    }

    #[test]
    fn test_append_jsonl_appends_lines() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("audit.jsonl");
        let path = path.to_string_lossy().to_string();
        append_jsonl(&path, &json!({"a": 1}));
        append_jsonl(&path, &json!({"a": 2}));
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }
}
