//! Environment variable overrides, applied on top of the config file.

use super::file::ConfigFileError;
use super::parser::{capacity_reason, expand_tilde, parse_capacity};
use super::settings::ConfigFile;

/// Overrides `[queue] capacity`.
pub const ENV_QUEUE_CAPACITY: &str = "SERIALGATE_QUEUE_CAPACITY";

/// Overrides `[logging] file`.
pub const ENV_LOG_FILE: &str = "SERIALGATE_LOG_FILE";

impl ConfigFile {
    /// Applies overrides from the process environment.
    pub fn with_env_overrides(self) -> Result<Self, ConfigFileError> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary variable lookup.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Result<Self, ConfigFileError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_QUEUE_CAPACITY) {
            self.queue.capacity = parse_capacity(&v).ok_or_else(|| ConfigFileError::InvalidValue {
                section: "env".to_string(),
                key: ENV_QUEUE_CAPACITY.to_string(),
                value: v.clone(),
                reason: capacity_reason(),
            })?;
        }

        if let Some(v) = lookup(ENV_LOG_FILE) {
            let v = v.trim();
            if !v.is_empty() {
                self.logging.file = expand_tilde(v);
            }
        }

        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_no_overrides() {
        let config = ConfigFile::default().with_overrides_from(lookup(&[])).unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_overrides_applied() {
        let config = ConfigFile::default()
            .with_overrides_from(lookup(&[
                (ENV_QUEUE_CAPACITY, "3"),
                (ENV_LOG_FILE, "/tmp/gate.log"),
            ]))
            .unwrap();

        assert_eq!(config.queue.capacity, 3);
        assert_eq!(config.logging.file, PathBuf::from("/tmp/gate.log"));
    }

    #[test]
    fn test_invalid_capacity_override() {
        let err = ConfigFile::default()
            .with_overrides_from(lookup(&[(ENV_QUEUE_CAPACITY, "-1")]))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_QUEUE_CAPACITY));
    }

    #[test]
    fn test_oversized_capacity_override() {
        let huge = usize::MAX.to_string();
        let err = ConfigFile::default()
            .with_overrides_from(lookup(&[(ENV_QUEUE_CAPACITY, huge.as_str())]))
            .unwrap_err();
        assert!(err.to_string().contains("at most"));
    }
}
