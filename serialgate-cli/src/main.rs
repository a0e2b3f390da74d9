//! serialgate CLI - Command-line interface
//!
//! Runs the built-in demo engine behind the request gate. Each line read
//! from stdin becomes one request; answers are printed to stdout as the
//! worker produces them.

mod commands;
mod demo_engine;
mod error;
mod runner;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::config::ConfigCommands;
use commands::run::RunArgs;

#[derive(Parser)]
#[command(name = "serialgate")]
#[command(version, about = "Serialize concurrent requests onto a single compute worker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the worker and answer requests read from stdin (one per line)
    Run {
        /// Config file to use instead of ~/.serialgate/config.ini
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the admission queue capacity
        #[arg(long)]
        capacity: Option<usize>,

        /// Enable debug-level logging
        #[arg(long)]
        debug: bool,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            config,
            capacity,
            debug,
        } => commands::run::run(RunArgs {
            config,
            capacity,
            debug,
        }),
        Commands::Config { command } => commands::config::run(command),
    };

    if let Err(e) = result {
        e.exit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_with_overrides() {
        let cli = Cli::try_parse_from([
            "serialgate",
            "run",
            "--config",
            "/tmp/gate.ini",
            "--capacity",
            "4",
            "--debug",
        ])
        .unwrap();

        match cli.command {
            Commands::Run {
                config,
                capacity,
                debug,
            } => {
                assert_eq!(config, Some(PathBuf::from("/tmp/gate.ini")));
                assert_eq!(capacity, Some(4));
                assert!(debug);
            }
            _ => panic!("expected run command"),
        }
    }

    #[test]
    fn test_parse_config_subcommand() {
        let cli = Cli::try_parse_from(["serialgate", "config", "path"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config {
                command: ConfigCommands::Path
            }
        ));
    }

    #[test]
    fn test_capacity_must_be_numeric() {
        assert!(Cli::try_parse_from(["serialgate", "run", "--capacity", "many"]).is_err());
    }
}
