//! Tracing setup for the CLI.
//!
//! Logs go to stderr by default so stdout stays clean for reports.
//! `AUDIT_NOTES_LOG_DIR` switches to a daily-rolling file instead.
//! `AUDIT_NOTES_DEBUG_LOG=1` forces debug level; otherwise `RUST_LOG` or `warn`.

use std::env;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const LOG_DIR_ENV: &str = "AUDIT_NOTES_LOG_DIR";
const DEBUG_ENV: &str = "AUDIT_NOTES_DEBUG_LOG";
const LOG_FILE_PREFIX: &str = "audit-notes.log";

/// Installs the global subscriber. Keep the returned guard alive until exit
/// so buffered file output is flushed.
pub fn init() -> Option<WorkerGuard> {
    let filter = build_filter();

    match env::var_os(LOG_DIR_ENV).filter(|v| !v.is_empty()) {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .try_init();
            Some(guard)
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .try_init();
            None
        }
    }
}

fn build_filter() -> EnvFilter {
    let debug_enabled = env::var(DEBUG_ENV)
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false);
    if debug_enabled {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    }
}
