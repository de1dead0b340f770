//! Observability: tracing init and the JSONL audit log.
//!
//! Reads `config::ObservabilityConfig` for MFASCRAPE_QUIET, LOG_LEVEL, LOG_JSON
//! and AUDIT_LOG. Logs go to stderr so script and tool stdout stays untouched.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use serde_json::json;
use tracing_subscriber::{prelude::*, EnvFilter};

use crate::config::ObservabilityConfig;

static AUDIT_PATH: Mutex<Option<String>> = Mutex::new(None);

/// Initialize tracing. Call once at process startup.
/// With MFASCRAPE_QUIET=1 only WARN and above are logged.
pub fn init_tracing() {
    let cfg = ObservabilityConfig::from_env();
    let level = if cfg.quiet {
        "mfascrape=warn".to_string()
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
                    .with_writer(std::io::stderr)
                    .with_target(true),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false),
            )
            .try_init()
    };
}

fn get_audit_path() -> Option<String> {
    {
        let guard = AUDIT_PATH.lock().ok()?;
        if let Some(ref p) = *guard {
            return Some(p.clone());
        }
    }
    let path = ObservabilityConfig::from_env().audit_log.clone()?;
    if let Some(parent) = Path::new(&path).parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    {
        let mut guard = AUDIT_PATH.lock().ok()?;
        *guard = Some(path.clone());
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

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Audit: task_started (right before the tool is spawned)
pub fn audit_task_started(task: &str, program: &str, args: &[String], cwd: &str) {
    if let Some(path) = get_audit_path() {
        let record = json!({
            "ts": now_rfc3339(),
            "event": "task_started",
            "task": task,
            "program": program,
            "args": args,
            "cwd": cwd,
        });
        append_jsonl(&path, &record);
    }
}

/// Audit: task_completed
pub fn audit_task_completed(task: &str, exit_code: i32, duration_ms: u64) {
    if let Some(path) = get_audit_path() {
        let record = json!({
            "ts": now_rfc3339(),
            "event": "task_completed",
            "task": task,
            "exit_code": exit_code,
            "duration_ms": duration_ms,
            "success": exit_code == 0,
        });
        append_jsonl(&path, &record);
    }
}

/// Audit: artifact_created. A missing prerequisite has been built.
pub fn audit_artifact_created(artifact: &str, duration_ms: u64) {
    if let Some(path) = get_audit_path() {
        let record = json!({
            "ts": now_rfc3339(),
            "event": "artifact_created",
            "artifact": artifact,
            "duration_ms": duration_ms,
        });
        append_jsonl(&path, &record);
    }
}
