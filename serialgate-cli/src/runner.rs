//! CLI runner for common setup.
//!
//! Encapsulates config loading (file, environment, command-line overrides)
//! and logging initialization so command handlers start from a ready state.

use std::path::Path;

use tracing::info;

use crate::error::CliError;
use serialgate::config::ConfigFile;
use serialgate::gate::MAX_QUEUE_CAPACITY;
use serialgate::logging::{init_logging, LoggingGuard};

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    logging_guard: LoggingGuard,
    /// Effective configuration
    config: ConfigFile,
}

impl CliRunner {
    /// Load config and initialize logging.
    ///
    /// # Arguments
    ///
    /// * `config_path` - Explicit config file; the default location is used when `None`
    /// * `capacity` - Queue capacity override from the command line
    /// * `debug_mode` - When true, enables debug-level logging unless RUST_LOG says otherwise
    pub fn with_options(
        config_path: Option<&Path>,
        capacity: Option<usize>,
        debug_mode: bool,
    ) -> Result<Self, CliError> {
        let config = load_config(config_path, capacity)?;

        let level = if debug_mode { "debug" } else { "info" };
        let logging_guard = init_logging(&config.logging.file, config.logging.console, level)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    /// Get the effective configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("serialgate v{}", serialgate::VERSION);
        info!("serialgate CLI: {} command", command);
        info!(
            log_file = %self.logging_guard.log_path().display(),
            queue_capacity = self.config.queue.capacity,
            worker = %self.config.worker.thread_name,
            "Configuration loaded"
        );
    }
}

/// Builds the effective configuration.
///
/// Precedence, lowest to highest: built-in defaults, config file,
/// environment variables, command-line flags.
pub fn load_config(
    config_path: Option<&Path>,
    capacity: Option<usize>,
) -> Result<ConfigFile, CliError> {
    let config = match config_path {
        Some(path) => {
            if !path.exists() {
                return Err(CliError::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            ConfigFile::load_from(path)?
        }
        None => ConfigFile::load()?,
    };

    let mut config = config.with_env_overrides()?;

    if let Some(capacity) = capacity {
        if capacity == 0 || capacity > MAX_QUEUE_CAPACITY {
            return Err(CliError::Config(format!(
                "--capacity must be a positive integer (at most {})",
                MAX_QUEUE_CAPACITY
            )));
        }
        config.queue.capacity = capacity;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_explicit_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("gate.ini");
        std::fs::write(&path, "[queue]\ncapacity = 6\n\n[engine]\nmode = reverse\n").unwrap();

        let config = load_config(Some(&path), None).unwrap();
        assert_eq!(config.engine.get("mode"), Some("reverse"));
        // The environment may override capacity; the flag always wins.
        let config = load_config(Some(&path), Some(2)).unwrap();
        assert_eq!(config.queue.capacity, 2);
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("absent.ini");

        let err = load_config(Some(&path), None).unwrap_err();
        assert!(matches!(err, CliError::Config(ref msg) if msg.contains("not found")));
    }

    #[test]
    fn test_zero_capacity_flag_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("gate.ini");
        std::fs::write(&path, "").unwrap();

        assert!(matches!(
            load_config(Some(&path), Some(0)),
            Err(CliError::Config(_))
        ));
    }

    #[test]
    fn test_oversized_capacity_flag_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("gate.ini");
        std::fs::write(&path, "").unwrap();

        let err = load_config(Some(&path), Some(usize::MAX)).unwrap_err();
        assert!(err.to_string().contains("at most"));
        assert_eq!(
            load_config(Some(&path), Some(MAX_QUEUE_CAPACITY))
                .unwrap()
                .queue
                .capacity,
            MAX_QUEUE_CAPACITY
        );
    }

    #[test]
    fn test_invalid_file_value_reported() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("gate.ini");
        std::fs::write(&path, "[queue]\ncapacity = none\n").unwrap();

        let err = load_config(Some(&path), None).unwrap_err();
        assert!(err.to_string().contains("queue.capacity"));
    }
}
