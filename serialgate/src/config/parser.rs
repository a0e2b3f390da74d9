//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use ini::Ini;
use std::path::PathBuf;

use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::gate::MAX_QUEUE_CAPACITY;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [queue] section
    if let Some(section) = ini.section(Some("queue")) {
        if let Some(v) = section.get("capacity") {
            config.queue.capacity = parse_capacity(v).ok_or_else(|| ConfigFileError::InvalidValue {
                section: "queue".to_string(),
                key: "capacity".to_string(),
                value: v.to_string(),
                reason: capacity_reason(),
            })?;
        }
    }

    // [worker] section
    if let Some(section) = ini.section(Some("worker")) {
        if let Some(v) = section.get("thread_name") {
            let v = v.trim();
            if v.is_empty() {
                return Err(ConfigFileError::InvalidValue {
                    section: "worker".to_string(),
                    key: "thread_name".to_string(),
                    value: v.to_string(),
                    reason: "must not be empty".to_string(),
                });
            }
            config.worker.thread_name = v.to_string();
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("console") {
            config.logging.console = parse_bool(v);
        }
    }

    // [engine] section, passed through untouched
    if let Some(section) = ini.section(Some("engine")) {
        for (key, value) in section.iter() {
            config.engine.set(key, value.trim());
        }
    }

    Ok(config)
}

/// Parses a queue capacity: a positive integer no larger than
/// [`MAX_QUEUE_CAPACITY`].
pub(super) fn parse_capacity(value: &str) -> Option<usize> {
    value
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|n| (1..=MAX_QUEUE_CAPACITY).contains(n))
}

pub(super) fn capacity_reason() -> String {
    format!("must be a positive integer (at most {})", MAX_QUEUE_CAPACITY)
}

/// Parse a boolean value from a config string.
/// Accepts: true/false, yes/no, 1/0, on/off (case-insensitive)
pub(super) fn parse_bool(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    v == "true" || v == "1" || v == "yes" || v == "on"
}

/// Expand ~ to home directory in paths.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
