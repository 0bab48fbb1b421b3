use anyhow::{Context, Result};
use std::io;
use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

const DEFAULT_STDERR_FILTER: &str = "warn,rfo=info";
const FILE_FILTER: &str = "rfo=debug,rfo_cli=debug,info";
const LOG_FILE_PREFIX: &str = "rfo.log";

/// Install the global subscriber.
///
/// Logs go to stderr so command output on stdout stays machine-readable.
/// When `log_dir` is given, a daily rolling `rfo.log` is written there too;
/// a directory that cannot be created or written is reported as an error.
pub fn configure_logging(log_dir: Option<&Path>) -> Result<()> {
    let stderr_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_STDERR_FILTER));

    let stderr_log = fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .with_filter(stderr_filter);

    let file_log = match log_dir {
        Some(dir) => Some(
            fmt::layer()
                .with_writer(daily_appender(dir)?)
                .with_ansi(false)
                .with_filter(EnvFilter::new(FILE_FILTER)),
        ),
        None => None,
    };

    tracing_subscriber::Registry::default()
        .with(stderr_log)
        .with(file_log)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}

fn daily_appender(dir: &Path) -> Result<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .build(dir)
        .with_context(|| format!("Failed to open log directory {}", dir.display()))
}
