//! Tracing subscriber installation.
//!
//! Library code only emits `tracing` events; binaries and test suites call
//! [`init_tracing`] once to see them.

use crate::config::LoggingConfig;
use std::env;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::OnceLock;
use tracing_appender::non_blocking::WorkerGuard;

static TRACE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Install a global fmt subscriber.
///
/// `SQLRT_LOG_LEVEL` and `SQLRT_LOG_JSON` take precedence over `config`.
/// Returns `false` if a global subscriber was already installed or the log
/// file could not be opened.
pub fn init_tracing(config: &LoggingConfig) -> bool {
    let json = env::var("SQLRT_LOG_JSON")
        .ok()
        .map_or_else(|| config.format == "json", |v| v != "0");

    let level = env::var("SQLRT_LOG_LEVEL")
        .ok()
        .unwrap_or_else(|| config.level.clone());

    let (non_blocking, guard) = match &config.file {
        Some(path) => {
            let file = match open_log_file(path) {
                Ok(f) => f,
                Err(e) => {
                    eprintln!("ERROR: Unable to open log file '{}': {e}", path.display());
                    return false;
                }
            };
            tracing_appender::non_blocking(file)
        }
        None => tracing_appender::non_blocking(std::io::stderr()),
    };

    let filter = tracing_subscriber::EnvFilter::try_new(level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_thread_names(true)
        .with_writer(non_blocking);

    let installed = if json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.compact().finish())
    };
    if installed.is_err() {
        return false;
    }
    let _ = TRACE_GUARD.set(guard);
    true
}

fn open_log_file(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}
