//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;
use serialgate::config::ConfigFileError;
use serialgate::gate::{ServiceError, WorkerExit};

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Failed to start the compute service
    ServiceStart(ServiceError),
    /// Failed to install the Ctrl-C handler
    SignalHandler(String),
    /// I/O error (runtime creation, stdin)
    Io(std::io::Error),
    /// The worker died instead of shutting down
    WorkerTerminated(WorkerExit),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::ServiceStart(ServiceError::EngineConstruction(_)) => {
                eprintln!();
                eprintln!("The engine could not be built. Check the [engine] section of");
                eprintln!("your config file ('serialgate config show' prints it).");
            }
            CliError::WorkerTerminated(_) => {
                eprintln!();
                eprintln!("See the log file for the panic report and the request that caused it.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::ServiceStart(e) => write!(f, "Failed to start service: {}", e),
            CliError::SignalHandler(msg) => write!(f, "Failed to set signal handler: {}", msg),
            CliError::Io(e) => write!(f, "I/O error: {}", e),
            CliError::WorkerTerminated(exit) => write!(f, "Compute worker terminated: {}", exit),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ServiceStart(e) => Some(e),
            CliError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ServiceError> for CliError {
    fn from(e: ServiceError) -> Self {
        CliError::ServiceStart(e)
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}
