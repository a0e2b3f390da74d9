//! Logging infrastructure for serialgate.
//!
//! Provides structured logging with file output and optional console output:
//! - Writes to the configured trace file (cleared on session start)
//! - Optionally mirrors to stderr, keeping stdout free for program output
//! - Configurable via RUST_LOG environment variable
//!
//! The file is the trace destination: with a
//! [`TracingTelemetrySink`](crate::gate::TracingTelemetrySink) installed it
//! receives a timestamped record for every admission, dequeue, compute and
//! delivery.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Guard that must be kept alive for the duration of logging.
///
/// Dropping this guard will flush and close the log file writer.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
    log_path: PathBuf,
}

impl LoggingGuard {
    /// Path of the log file being written.
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }
}

/// Initialize logging system.
///
/// Creates the log directory if needed, clears the previous log file and
/// installs the global subscriber.
///
/// # Arguments
///
/// * `log_file` - Path of the log file (e.g., "logs/serialgate.log")
/// * `console` - Also print log records to stderr
/// * `default_level` - Filter used when RUST_LOG is not set (e.g., "info")
///
/// # Errors
///
/// Returns an error if the log directory cannot be created, the log file
/// cannot be cleared, or a global subscriber is already installed.
pub fn init_logging(
    log_file: &Path,
    console: bool,
    default_level: &str,
) -> Result<LoggingGuard, io::Error> {
    let (log_dir, file_name) = split_log_path(log_file)?;

    fs::create_dir_all(&log_dir)?;
    fs::write(log_file, "")?;

    let file_appender = tracing_appender::rolling::never(&log_dir, &file_name);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_thread_names(true)
        .with_target(false);

    let console_layer = console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .with_ansi(true)
            .with_target(false)
            .compact()
    });

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::AlreadyExists, e.to_string()))?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
        log_path: log_file.to_path_buf(),
    })
}

/// Splits a log file path into its directory and file name.
fn split_log_path(log_file: &Path) -> Result<(PathBuf, String), io::Error> {
    let file_name = log_file
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("log file path has no file name: {}", log_file.display()),
            )
        })?
        .to_string();

    let log_dir = match log_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    Ok((log_dir, file_name))
}

/// Get default log directory path.
pub fn default_log_dir() -> &'static str {
    "logs"
}

/// Get default log file name.
pub fn default_log_file() -> &'static str {
    "serialgate.log"
}
