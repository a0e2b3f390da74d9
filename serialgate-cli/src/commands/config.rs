//! Configuration management CLI commands.
//!
//! Provides `config path`, `config show` and `config init` for locating,
//! inspecting and creating the configuration file.

use std::fmt::Write as _;
use std::path::PathBuf;

use clap::Subcommand;
use serialgate::config::{config_file_path, ConfigFile};

use crate::error::CliError;
use crate::runner::load_config;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,

    /// Show the effective settings (file plus environment overrides)
    Show {
        /// Config file to read instead of the default location
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Write a commented default configuration file
    ///
    /// An existing file is left untouched.
    Init {
        /// Where to write the file instead of the default location
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Path => run_path(),
        ConfigCommands::Show { config } => run_show(config),
        ConfigCommands::Init { path } => run_init(path),
    }
}

/// Show the configuration file path.
fn run_path() -> Result<(), CliError> {
    println!("{}", config_file_path().display());
    Ok(())
}

/// Show the effective settings.
fn run_show(config_path: Option<PathBuf>) -> Result<(), CliError> {
    let config = load_config(config_path.as_deref(), None)?;

    println!("Configuration Settings");
    println!("======================");
    println!();
    print!("{}", format_settings(&config));

    Ok(())
}

/// Create a config file unless one exists.
fn run_init(path: Option<PathBuf>) -> Result<(), CliError> {
    let path = path.unwrap_or_else(config_file_path);

    if ConfigFile::ensure_exists_at(&path)? {
        println!("Created configuration file: {}", path.display());
    } else {
        println!("Configuration file already exists: {}", path.display());
    }

    Ok(())
}

/// Lists every setting grouped by section.
fn format_settings(config: &ConfigFile) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "[queue]");
    let _ = writeln!(out, "  capacity = {}", config.queue.capacity);
    let _ = writeln!(out);
    let _ = writeln!(out, "[worker]");
    let _ = writeln!(out, "  thread_name = {}", config.worker.thread_name);
    let _ = writeln!(out);
    let _ = writeln!(out, "[logging]");
    let _ = writeln!(out, "  file = {}", config.logging.file.display());
    let _ = writeln!(out, "  console = {}", config.logging.console);
    let _ = writeln!(out);
    let _ = writeln!(out, "[engine]");
    if config.engine.is_empty() {
        let _ = writeln!(out, "  (not set)");
    }
    for (key, value) in config.engine.iter() {
        let _ = writeln!(out, "  {} = {}", key, value);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_format_default_settings() {
        let text = format_settings(&ConfigFile::default());

        assert!(text.contains("[queue]\n  capacity = 1024\n"));
        assert!(text.contains("thread_name = compute-worker"));
        assert!(text.contains("[engine]\n  (not set)\n"));
    }

    #[test]
    fn test_format_engine_settings() {
        let mut config = ConfigFile::default();
        config.engine.set("mode", "echo");

        let text = format_settings(&config);
        assert!(text.contains("  mode = echo"));
        assert!(!text.contains("(not set)"));
    }

    #[test]
    fn test_init_writes_once() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("serialgate").join("config.ini");

        run_init(Some(path.clone())).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("[queue]"));

        std::fs::write(&path, "[queue]\ncapacity = 3\n").unwrap();
        run_init(Some(path.clone())).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "[queue]\ncapacity = 3\n"
        );
    }
}
