//! File logging. The terminal belongs to the UI, so nothing goes to stderr.

use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "careerdesk_tui=info,careerdesk_core=info";
const LOG_FILE: &str = "careerdesk.log";

pub fn default_log_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_local_dir()
        .ok_or_else(|| anyhow!("Could not determine data directory"))?;
    Ok(data_dir.join("careerdesk").join("logs"))
}

/// Install the global subscriber. Keep the guard alive until exit or
/// buffered lines are lost.
pub fn init(log_dir: Option<PathBuf>) -> Result<WorkerGuard> {
    let dir = match log_dir {
        Some(dir) => dir,
        None => default_log_dir()?,
    };
    fs::create_dir_all(&dir)?;

    let appender = tracing_appender::rolling::never(&dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false),
        )
        .try_init()?;

    tracing::info!(dir = %dir.display(), "logging initialized");
    Ok(guard)
}
