//! Logging setup
//!
//! Structured `tracing` output goes to a daily-rolling JSON file, and
//! optionally to stderr. `RUST_LOG` overrides the default filter.

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "stock_agent=info";

/// File name prefix for rolling logs
const LOG_FILE_PREFIX: &str = "stock-agent.log";

/// Build the filter from `RUST_LOG`, falling back to `DEFAULT_FILTER`
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber
///
/// The returned guard flushes the file writer on drop; hold it for the
/// lifetime of the process. Interactive console sessions pass
/// `stderr = false` so log lines do not interleave with the UI.
pub fn init_logging(log_dir: &Path, stderr: bool) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(file_writer)
        .with_target(true);

    let stderr_layer = stderr.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
    });

    tracing_subscriber::registry()
        .with(env_filter())
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::info!("Logging to {}", log_dir.display());

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_creates_log_dir() {
        let temp = tempfile::TempDir::new().unwrap();
        let dir = temp.path().join("nested").join("logs");

        // A subscriber may already be installed by another test; the
        // directory is created either way
        let _ = init_logging(&dir, false);
        assert!(dir.is_dir());
    }
}
