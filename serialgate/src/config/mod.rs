//! User configuration.
//!
//! Settings are read from an INI file (`~/.serialgate/config.ini` unless a
//! path is given), then overridden from the environment. The result converts
//! into the core's [`GateConfig`](crate::gate::GateConfig).
//!
//! # Example
//!
//! ```
//! use serialgate::config::ConfigFile;
//! use serialgate::gate::GateConfig;
//!
//! let file = ConfigFile::default();
//! let gate = GateConfig::from(&file);
//! assert_eq!(gate.queue_capacity, 1024);
//! ```

mod defaults;
mod env;
mod file;
mod parser;
mod settings;
mod writer;

pub use defaults::{DEFAULT_LOG_CONSOLE, DEFAULT_LOG_FILE};
pub use env::{ENV_LOG_FILE, ENV_QUEUE_CAPACITY};
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{ConfigFile, EngineSettings, LoggingSettings, QueueSettings, WorkerSettings};
