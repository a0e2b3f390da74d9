//! Gate configuration.
//!
//! This module contains the [`GateConfig`] struct and the defaults used when
//! no configuration file overrides them.

use super::error::ServiceError;
use std::num::NonZeroUsize;

// =============================================================================
// Configuration Constants
// =============================================================================

/// Default admission queue capacity.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Largest queue capacity the underlying channel can represent.
pub const MAX_QUEUE_CAPACITY: usize = tokio::sync::Semaphore::MAX_PERMITS;

/// Default name of the worker thread.
pub const DEFAULT_WORKER_THREAD_NAME: &str = "compute-worker";

// =============================================================================
// Gate Configuration
// =============================================================================

/// Configuration for [`ComputeService::start`](super::ComputeService::start).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GateConfig {
    /// Maximum number of admitted requests waiting for the worker.
    ///
    /// Requests beyond this are rejected with `QueueFull`. Must be between 1
    /// and [`MAX_QUEUE_CAPACITY`].
    pub queue_capacity: usize,

    /// Name given to the worker OS thread (shows up in logs and panics).
    pub worker_thread_name: String,
}

impl GateConfig {
    /// Default configuration with a different queue capacity.
    pub fn with_capacity(queue_capacity: usize) -> Self {
        Self {
            queue_capacity,
            ..Self::default()
        }
    }

    /// Checks the configuration, returning the validated capacity.
    pub fn validate(&self) -> Result<NonZeroUsize, ServiceError> {
        if self.worker_thread_name.trim().is_empty() {
            return Err(ServiceError::InvalidConfig(
                "worker thread name must not be empty".to_string(),
            ));
        }
        if self.worker_thread_name.contains('\0') {
            return Err(ServiceError::InvalidConfig(
                "worker thread name must not contain NUL bytes".to_string(),
            ));
        }
        if self.queue_capacity > MAX_QUEUE_CAPACITY {
            return Err(ServiceError::InvalidConfig(format!(
                "queue capacity must not exceed {}",
                MAX_QUEUE_CAPACITY
            )));
        }
        NonZeroUsize::new(self.queue_capacity).ok_or_else(|| {
            ServiceError::InvalidConfig("queue capacity must be positive".to_string())
        })
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            worker_thread_name: DEFAULT_WORKER_THREAD_NAME.to_string(),
        }
    }
}

impl From<&crate::config::ConfigFile> for GateConfig {
    fn from(config: &crate::config::ConfigFile) -> Self {
        Self {
            queue_capacity: config.queue.capacity,
            worker_thread_name: config.worker.thread_name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_config_default() {
        let config = GateConfig::default();
        assert_eq!(config.queue_capacity, DEFAULT_QUEUE_CAPACITY);
        assert_eq!(config.worker_thread_name, DEFAULT_WORKER_THREAD_NAME);
        assert_eq!(config.validate().unwrap().get(), DEFAULT_QUEUE_CAPACITY);
    }

    #[test]
    fn test_zero_capacity_is_invalid() {
        let err = GateConfig::with_capacity(0).validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid configuration: queue capacity must be positive"
        );
    }

    #[test]
    fn test_capacity_above_channel_limit_is_invalid() {
        assert_eq!(
            GateConfig::with_capacity(MAX_QUEUE_CAPACITY)
                .validate()
                .unwrap()
                .get(),
            MAX_QUEUE_CAPACITY
        );

        for capacity in [MAX_QUEUE_CAPACITY + 1, usize::MAX] {
            let err = GateConfig::with_capacity(capacity).validate().unwrap_err();
            assert!(err.to_string().contains("must not exceed"));
        }
    }

    #[test]
    fn test_thread_name_with_nul_is_invalid() {
        let config = GateConfig {
            worker_thread_name: "gpu\0worker".to_string(),
            ..GateConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ServiceError::InvalidConfig(ref msg)) if msg.contains("NUL")
        ));
    }

    #[test]
    fn test_blank_thread_name_is_invalid() {
        let config = GateConfig {
            worker_thread_name: "  ".to_string(),
            ..GateConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ServiceError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_from_config_file() {
        let mut file = crate::config::ConfigFile::default();
        file.queue.capacity = 3;
        file.worker.thread_name = "llm".to_string();

        let config = GateConfig::from(&file);
        assert_eq!(config.queue_capacity, 3);
        assert_eq!(config.worker_thread_name, "llm");
    }
}
