//! Tracing subscriber setup: console output plus a daily-rolling log file.

use crate::Result;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_PREFIX: &str = "pictionary-server.log";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub log_dir: PathBuf,
    /// Enables debug-level output for this crate.
    pub development: bool,
}

impl LogSettings {
    pub fn from_env() -> Self {
        Self {
            log_dir: std::env::var("LOG_DIR")
                .ok()
                .filter(|dir| !dir.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("logs")),
            development: std::env::var("APP_ENV").is_ok_and(|env| env == "development"),
        }
    }
}

/// Filter used when `RUST_LOG` is unset.
pub fn default_filter(development: bool) -> &'static str {
    if development {
        "pictionary_server=debug,tower_http=debug"
    } else {
        "pictionary_server=info,tower_http=info"
    }
}

/// Install the global subscriber. Keep the returned guard alive for the
/// life of the process or buffered file output is lost.
pub fn init(settings: &LogSettings) -> Result<WorkerGuard> {
    let file_writer = file_writer(&settings.log_dir)?;
    let (writer, guard) = tracing_appender::non_blocking(file_writer);

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(settings.development).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer),
        )
        .try_init()
        .map_err(|e| crate::Error::Generic(format!("Failed to initialize logging: {}", e)))?;

    Ok(guard)
}

fn file_writer(log_dir: &Path) -> Result<RollingFileAppender> {
    std::fs::create_dir_all(log_dir)?;
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .build(log_dir)
        .map_err(|e| crate::Error::Generic(format!("Failed to open log file: {}", e)))
}
