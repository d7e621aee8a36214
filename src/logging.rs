//! Logging setup.
//!
//! Scripted subcommands log to stderr. The interactive form owns the terminal,
//! so it logs to a per-launch file instead (`logs/` by default, or
//! `MODEL_TESTER_LOG_DIR`). `RUST_LOG` controls the filter; the default is `info`.

use std::fs::create_dir_all;
use std::path::PathBuf;
use std::sync::OnceLock;

use chrono::Local;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*};

use crate::error::AppError;

/// Environment variable overriding the log directory for interactive runs.
pub const LOG_DIR_ENV: &str = "MODEL_TESTER_LOG_DIR";
const DEFAULT_LOG_DIR: &str = "logs";
const LOG_FILE_PREFIX: &str = "model_tester";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Where log lines go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
}

impl LogTarget {
    /// File target in `MODEL_TESTER_LOG_DIR`, or `logs/` when unset.
    pub fn file_from_env() -> Self {
        let dir = std::env::var(LOG_DIR_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_DIR.to_string());
        LogTarget::File(PathBuf::from(dir))
    }
}

/// Install the global subscriber. Returns the log file path for file targets.
///
/// Subsequent calls are no-ops.
pub fn init(target: LogTarget) -> Result<Option<PathBuf>, AppError> {
    if LOG_GUARD.get().is_some() {
        return Ok(None);
    }

    match target {
        LogTarget::Stderr => {
            let subscriber = Registry::default()
                .with(build_env_filter())
                .with(fmt::layer().with_writer(std::io::stderr));
            tracing::subscriber::set_global_default(subscriber)
                .map_err(|e| AppError::runtime(format!("Failed to install tracing subscriber: {e}")))?;
            Ok(None)
        }
        LogTarget::File(dir) => {
            create_dir_all(&dir).map_err(|e| {
                AppError::runtime(format!("Failed to create log dir '{}': {e}", dir.display()))
            })?;
            let file_name = log_file_name();
            let path = dir.join(&file_name);

            let (writer, guard) = tracing_appender::non_blocking(rolling::never(&dir, &file_name));
            let subscriber = Registry::default()
                .with(build_env_filter())
                .with(fmt::layer().with_ansi(false).with_writer(writer));
            tracing::subscriber::set_global_default(subscriber)
                .map_err(|e| AppError::runtime(format!("Failed to install tracing subscriber: {e}")))?;
            let _ = LOG_GUARD.set(guard);

            tracing::info!("Logging initialized; log file at {}", path.display());
            Ok(Some(path))
        }
    }
}

fn log_file_name() -> String {
    format!("{LOG_FILE_PREFIX}_{}.log", Local::now().format("%Y-%m-%d_%H-%M-%S"))
}

fn build_env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}
