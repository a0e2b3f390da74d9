//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

use super::file::ConfigFileError;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// Admission queue settings
    pub queue: QueueSettings,
    /// Worker thread settings
    pub worker: WorkerSettings,
    /// Logging and trace destination settings
    pub logging: LoggingSettings,
    /// Free-form settings handed to the engine factory
    pub engine: EngineSettings,
}

/// Admission queue configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueSettings {
    /// Maximum number of requests waiting for the worker.
    pub capacity: usize,
}

/// Worker configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerSettings {
    /// OS thread name of the worker loop.
    pub thread_name: String,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Log file receiving the request trace.
    pub file: PathBuf,
    /// Also log to stderr.
    pub console: bool,
}

/// Engine configuration.
///
/// The gate never interprets these; they are passed to whatever builds the
/// engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineSettings {
    values: BTreeMap<String, String>,
}

impl EngineSettings {
    /// Returns the raw value for a key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Sets a value, replacing any previous one.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Parses a value, reporting a malformed one as an `[engine]` error.
    pub fn parse<T: FromStr>(&self, key: &str, expected: &str) -> Result<Option<T>, ConfigFileError> {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| ConfigFileError::InvalidValue {
                    section: "engine".to_string(),
                    key: key.to_string(),
                    value: raw.to_string(),
                    reason: expected.to_string(),
                }),
        }
    }

    /// Iterates over all keys and values in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns true if no engine settings are present.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_settings_parse() {
        let mut engine = EngineSettings::default();
        engine.set("delay_ms", "250");
        engine.set("mode", "upper");

        assert_eq!(engine.parse::<u64>("delay_ms", "integer").unwrap(), Some(250));
        assert_eq!(engine.parse::<u64>("missing", "integer").unwrap(), None);
        assert_eq!(engine.get("mode"), Some("upper"));
    }

    #[test]
    fn test_engine_settings_parse_error() {
        let mut engine = EngineSettings::default();
        engine.set("delay_ms", "soon");

        let err = engine
            .parse::<u64>("delay_ms", "must be a non-negative integer (milliseconds)")
            .unwrap_err();
        assert!(err.to_string().contains("engine.delay_ms = 'soon'"));
    }

    #[test]
    fn test_engine_settings_iter_is_sorted() {
        let mut engine = EngineSettings::default();
        engine.set("b", "2");
        engine.set("a", "1");

        let keys: Vec<&str> = engine.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }
}
