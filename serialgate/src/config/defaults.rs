//! Default values for all configuration settings and the
//! `ConfigFile::default()` implementation.

use std::path::PathBuf;

use super::settings::*;
use crate::gate::{DEFAULT_QUEUE_CAPACITY, DEFAULT_WORKER_THREAD_NAME};

/// Default log file, relative to the working directory.
pub const DEFAULT_LOG_FILE: &str = "logs/serialgate.log";

/// Whether logs are mirrored to stderr by default.
pub const DEFAULT_LOG_CONSOLE: bool = true;

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            queue: QueueSettings {
                capacity: DEFAULT_QUEUE_CAPACITY,
            },
            worker: WorkerSettings {
                thread_name: DEFAULT_WORKER_THREAD_NAME.to_string(),
            },
            logging: LoggingSettings {
                file: PathBuf::from(DEFAULT_LOG_FILE),
                console: DEFAULT_LOG_CONSOLE,
            },
            engine: EngineSettings::default(),
        }
    }
}
