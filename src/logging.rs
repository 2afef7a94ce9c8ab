//! File-based logging.
//!
//! The terminal belongs to the TUI, so tracing output goes to a daily
//! rolling file instead of stdout.

use std::fs;
use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{LoggingSettings, default_state_dir};
use crate::error::{Error, Result};

const LOG_FILE_PREFIX: &str = "reprise";

/// `[logging] directory`, else `<state dir>/logs`.
pub fn log_dir(settings: &LoggingSettings) -> Option<PathBuf> {
    settings
        .directory
        .clone()
        .or_else(|| default_state_dir().map(|d| d.join("logs")))
}

/// Install the global subscriber.
///
/// Logs land in `<dir>/reprise.YYYY-MM-DD`. `RUST_LOG` overrides the
/// configured filter. Keep the returned guard alive until exit or buffered
/// lines are lost.
pub fn init_logging(settings: &LoggingSettings) -> Result<WorkerGuard> {
    let dir = log_dir(settings)
        .ok_or_else(|| Error::InvalidSetting("no log directory could be determined".into()))?;
    fs::create_dir_all(&dir)?;

    let appender = RollingFileAppender::new(Rotation::DAILY, &dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.filter))
        .unwrap_or_else(|_| EnvFilter::new("reprise=debug,warn"));

    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_names(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .map_err(|e| Error::InvalidSetting(format!("logging already initialised: {e}")))?;

    tracing::info!(dir = %dir.display(), "logging initialised");
    Ok(guard)
}
