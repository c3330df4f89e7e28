use crate::persistence::{ensure_dir, resolve_data_dir, LOG_FILE_NAME};
use crate::sprint::format::parse_clock;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "calmsprint=info";

/// Resolved runtime configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    /// Cutoff override for this run, minutes from midnight
    pub latest_override: Option<u32>,
}

impl AppConfig {
    pub fn resolve(dir: Option<&Path>, latest_override: Option<u32>) -> Result<Self> {
        let cwd = std::env::current_dir().context("Could not determine current directory")?;
        let data_dir = resolve_data_dir(dir, &cwd)?;
        Ok(Self {
            data_dir,
            latest_override,
        })
    }

    /// Make sure the data directory exists before anything writes to it
    pub fn ensure_data_dir(&self) -> Result<()> {
        ensure_dir(&self.data_dir)
    }
}

/// Clap value parser for `--latest HH:MM`
pub fn parse_latest(input: &str) -> Result<u32, String> {
    parse_clock(input).ok_or_else(|| format!("expected HH:MM, got '{}'", input))
}

/// Where log lines go
#[derive(Debug, Clone)]
pub enum LogTarget {
    /// The TUI owns the terminal, so logs go to a file in this directory
    File(PathBuf),
    Stderr,
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Non-blocking writer appending to `calmsprint.log` in `dir`
fn file_writer(dir: &Path) -> Result<(NonBlocking, WorkerGuard)> {
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(LOG_FILE_NAME)
        .build(dir)
        .with_context(|| format!("Failed to open log file in {}", dir.display()))?;
    Ok(tracing_appender::non_blocking(appender))
}

/// Install the global tracing subscriber.
///
/// For a file target the returned guard flushes pending lines when dropped,
/// so the caller keeps it alive until exit.
pub fn init_logging(target: LogTarget) -> Result<Option<WorkerGuard>> {
    match target {
        LogTarget::File(dir) => {
            let (writer, guard) = file_writer(&dir)?;
            let installed = tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false)
                .try_init();
            // Already installed: dropping the guard shuts the extra writer down
            Ok(installed.ok().map(|_| guard))
        }
        LogTarget::Stderr => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(std::io::stderr)
                .with_target(false)
                .try_init();
            Ok(None)
        }
    }
}
