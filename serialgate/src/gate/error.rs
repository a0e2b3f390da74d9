//! Error types for admission, per-request outcomes and service lifecycle.

use crate::engine::ConstructError;
use thiserror::Error;

/// Admission-time failure. The request never entered the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AdmissionError {
    /// Queue is at capacity (backpressure).
    ///
    /// Callers should retry later or report an overload upstream.
    #[error("request queue full ({capacity} pending)")]
    QueueFull {
        /// Configured queue capacity.
        capacity: usize,
    },

    /// The worker loop is gone (stopped or crashed).
    #[error("compute worker is not running")]
    WorkerUnavailable,
}

impl AdmissionError {
    /// Returns true for the backpressure case.
    pub fn is_queue_full(&self) -> bool {
        matches!(self, Self::QueueFull { .. })
    }
}

/// Outcome delivered to a caller whose request was admitted but not
/// answered with a computed result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// The engine failed (or panicked) while computing this request.
    #[error("compute failed: {message}")]
    ComputeFailed {
        /// What the engine reported.
        message: String,
    },

    /// The worker loop stopped before producing a result.
    #[error("service shutting down")]
    ShutdownInFlight,

    /// The response was never delivered because the worker thread died.
    #[error("compute worker terminated without answering")]
    WorkerLost,
}

impl RequestError {
    /// Returns true if the request was cut short by a shutdown.
    pub fn is_shutdown(&self) -> bool {
        matches!(self, Self::ShutdownInFlight)
    }
}

/// Result type delivered on every response channel.
pub type Outcome<R> = Result<R, RequestError>;

/// Combined error for the submit-and-wait convenience calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    /// Rejected before any waiting.
    #[error(transparent)]
    Rejected(#[from] AdmissionError),

    /// Admitted, but no computed result.
    #[error(transparent)]
    Failed(#[from] RequestError),
}

/// Service lifecycle errors.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Invalid configuration passed to `start`.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The engine could not be constructed; nothing was admitted.
    #[error("engine construction failed: {0}")]
    EngineConstruction(#[source] ConstructError),

    /// The worker or supervisor thread could not be spawned.
    #[error("failed to spawn {thread} thread: {source}")]
    Spawn {
        /// Name of the thread that failed to start.
        thread: String,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admission_error_display() {
        assert_eq!(
            AdmissionError::QueueFull { capacity: 8 }.to_string(),
            "request queue full (8 pending)"
        );
        assert_eq!(
            AdmissionError::WorkerUnavailable.to_string(),
            "compute worker is not running"
        );
    }

    #[test]
    fn test_queue_full_predicate() {
        assert!(AdmissionError::QueueFull { capacity: 1 }.is_queue_full());
        assert!(!AdmissionError::WorkerUnavailable.is_queue_full());
    }

    #[test]
    fn test_request_error_display() {
        let err = RequestError::ComputeFailed {
            message: "out of memory".to_string(),
        };
        assert_eq!(err.to_string(), "compute failed: out of memory");
        assert!(RequestError::ShutdownInFlight.is_shutdown());
        assert!(!RequestError::WorkerLost.is_shutdown());
    }

    #[test]
    fn test_call_error_is_transparent() {
        let rejected: CallError = AdmissionError::QueueFull { capacity: 2 }.into();
        assert_eq!(rejected.to_string(), "request queue full (2 pending)");

        let failed: CallError = RequestError::ShutdownInFlight.into();
        assert_eq!(failed.to_string(), "service shutting down");
    }

    #[test]
    fn test_service_error_source() {
        use std::error::Error;

        let err = ServiceError::EngineConstruction(ConstructError::new("no device"));
        assert_eq!(err.to_string(), "engine construction failed: no device");
        assert!(err.source().is_some());
    }
}
