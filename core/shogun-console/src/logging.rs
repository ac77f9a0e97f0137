//! Tracing setup for the console.
//!
//! Logs go to a daily rolling file under the data directory so the live view
//! on stdout stays clean. If that directory is unusable, logs go to stderr.

use std::env;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "SHOGUN_GUI_LOG";
const DEBUG_ENV: &str = "SHOGUN_GUI_DEBUG_LOG";
const LOG_FILE_PREFIX: &str = "shogun-console.log";

/// Installs the global subscriber. Keep the returned guard alive until exit
/// or buffered file output is lost.
pub fn init(logs_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = build_filter();

    let Some(dir) = logs_dir.filter(|dir| fs_ready(dir)) else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        return None;
    };

    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(writer)
        .init();
    Some(guard)
}

fn build_filter() -> EnvFilter {
    if debug_enabled(env::var(DEBUG_ENV).ok().as_deref()) {
        return EnvFilter::new("debug");
    }
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

fn debug_enabled(value: Option<&str>) -> bool {
    matches!(value, Some("1" | "true" | "TRUE" | "yes" | "YES"))
}

fn fs_ready(dir: &Path) -> bool {
    fs_err::create_dir_all(dir).is_ok()
}
