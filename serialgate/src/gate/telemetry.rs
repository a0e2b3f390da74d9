//! Telemetry for request admission and processing.
//!
//! The gate emits structured events through a sink. It doesn't know how the
//! events are consumed: the embedding process decides whether they end up
//! in a trace file, a metrics counter or nowhere at all.
//!
//! # Example
//!
//! ```ignore
//! use serialgate::gate::{TelemetryEvent, TelemetrySink};
//!
//! struct RejectionCounter(std::sync::atomic::AtomicU64);
//!
//! impl TelemetrySink for RejectionCounter {
//!     fn emit(&self, event: TelemetryEvent) {
//!         if let TelemetryEvent::RequestRejected { .. } = event {
//!             self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
//!         }
//!     }
//! }
//! ```

use super::envelope::RequestId;
use std::sync::Arc;
use std::time::Duration;

// =============================================================================
// Telemetry Events
// =============================================================================

/// Events emitted along the request path and by the worker lifecycle.
#[derive(Clone, Debug, PartialEq)]
pub enum TelemetryEvent {
    // -------------------------------------------------------------------------
    // Admission
    // -------------------------------------------------------------------------
    /// A request entered the queue.
    RequestAdmitted {
        request_id: RequestId,
        queue_depth: usize,
    },

    /// A request was refused at admission.
    RequestRejected {
        request_id: RequestId,
        queue_full: bool,
        queue_depth: usize,
    },

    // -------------------------------------------------------------------------
    // Processing
    // -------------------------------------------------------------------------
    /// The worker took a request off the queue.
    RequestDequeued {
        request_id: RequestId,
        wait_time: Duration,
    },

    /// The engine produced a result.
    ComputeSucceeded {
        request_id: RequestId,
        duration: Duration,
    },

    /// The engine failed, panicked or was interrupted on this request.
    ComputeFailed {
        request_id: RequestId,
        duration: Duration,
        message: String,
    },

    /// An outcome was handed to the response channel.
    ResponseDelivered {
        request_id: RequestId,
        /// False when the caller had already stopped listening.
        delivered: bool,
        total_time: Duration,
    },

    // -------------------------------------------------------------------------
    // Worker Lifecycle
    // -------------------------------------------------------------------------
    /// The engine is built and the worker loop accepts requests.
    WorkerStarted { construction_time: Duration },

    /// The worker loop terminated.
    WorkerStopped {
        reason: String,
        expected: bool,
        processed: u64,
        drained: usize,
    },

    /// The engine factory failed; the service never started.
    EngineConstructionFailed { message: String },
}

impl TelemetryEvent {
    /// Returns the request ID associated with this event, if any.
    pub fn request_id(&self) -> Option<RequestId> {
        match self {
            Self::RequestAdmitted { request_id, .. }
            | Self::RequestRejected { request_id, .. }
            | Self::RequestDequeued { request_id, .. }
            | Self::ComputeSucceeded { request_id, .. }
            | Self::ComputeFailed { request_id, .. }
            | Self::ResponseDelivered { request_id, .. } => Some(*request_id),
            Self::WorkerStarted { .. }
            | Self::WorkerStopped { .. }
            | Self::EngineConstructionFailed { .. } => None,
        }
    }

    /// Returns a short name for this event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::RequestAdmitted { .. } => "request_admitted",
            Self::RequestRejected { .. } => "request_rejected",
            Self::RequestDequeued { .. } => "request_dequeued",
            Self::ComputeSucceeded { .. } => "compute_succeeded",
            Self::ComputeFailed { .. } => "compute_failed",
            Self::ResponseDelivered { .. } => "response_delivered",
            Self::WorkerStarted { .. } => "worker_started",
            Self::WorkerStopped { .. } => "worker_stopped",
            Self::EngineConstructionFailed { .. } => "engine_construction_failed",
        }
    }
}

// =============================================================================
// Telemetry Sink Trait
// =============================================================================

/// Sink for telemetry events.
///
/// Events are emitted from producer contexts and from the worker thread, so
/// implementations must be `Send + Sync`. `emit` runs on the request path
/// and must not block.
pub trait TelemetrySink: Send + Sync {
    /// Called when a telemetry event occurs.
    fn emit(&self, event: TelemetryEvent);
}

// =============================================================================
// Built-in Sink Implementations
// =============================================================================

/// No-op sink.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTelemetrySink;

impl TelemetrySink for NullTelemetrySink {
    fn emit(&self, _event: TelemetryEvent) {}
}

/// Sink that writes every event as a `tracing` record.
///
/// With the file layer from [`crate::logging`] installed this is the
/// timestamped trace destination for admission, dequeue, compute duration
/// and delivery.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTelemetrySink;

impl TelemetrySink for TracingTelemetrySink {
    fn emit(&self, event: TelemetryEvent) {
        match &event {
            TelemetryEvent::RequestAdmitted {
                request_id,
                queue_depth,
            } => {
                tracing::debug!(
                    request_id = %request_id,
                    queue_depth = queue_depth,
                    "Request admitted"
                );
            }
            TelemetryEvent::RequestRejected {
                request_id,
                queue_full,
                queue_depth,
            } => {
                tracing::warn!(
                    request_id = %request_id,
                    queue_full = queue_full,
                    queue_depth = queue_depth,
                    "Request rejected"
                );
            }
            TelemetryEvent::RequestDequeued {
                request_id,
                wait_time,
            } => {
                tracing::debug!(
                    request_id = %request_id,
                    wait_time_ms = wait_time.as_millis(),
                    "Request dequeued"
                );
            }
            TelemetryEvent::ComputeSucceeded {
                request_id,
                duration,
            } => {
                tracing::info!(
                    request_id = %request_id,
                    duration_ms = duration.as_millis(),
                    "Compute succeeded"
                );
            }
            TelemetryEvent::ComputeFailed {
                request_id,
                duration,
                message,
            } => {
                tracing::warn!(
                    request_id = %request_id,
                    duration_ms = duration.as_millis(),
                    error = %message,
                    "Compute failed"
                );
            }
            TelemetryEvent::ResponseDelivered {
                request_id,
                delivered,
                total_time,
            } => {
                tracing::debug!(
                    request_id = %request_id,
                    delivered = delivered,
                    total_time_ms = total_time.as_millis(),
                    "Response delivered"
                );
            }
            TelemetryEvent::WorkerStarted { construction_time } => {
                tracing::info!(
                    construction_ms = construction_time.as_millis(),
                    "Compute worker started"
                );
            }
            TelemetryEvent::WorkerStopped {
                reason,
                expected,
                processed,
                drained,
            } => {
                if *expected {
                    tracing::info!(
                        reason = %reason,
                        processed = processed,
                        drained = drained,
                        "Compute worker stopped"
                    );
                } else {
                    tracing::error!(
                        reason = %reason,
                        processed = processed,
                        drained = drained,
                        "Compute worker stopped unexpectedly"
                    );
                }
            }
            TelemetryEvent::EngineConstructionFailed { message } => {
                tracing::error!(error = %message, "Engine construction failed");
            }
        }
    }
}

/// Sink that forwards events to multiple sinks.
pub struct MultiplexTelemetrySink {
    sinks: Vec<Arc<dyn TelemetrySink>>,
}

impl MultiplexTelemetrySink {
    /// Creates a new multiplex sink with the given sinks.
    pub fn new(sinks: Vec<Arc<dyn TelemetrySink>>) -> Self {
        Self { sinks }
    }

    /// Adds a sink to the multiplex.
    pub fn add_sink(&mut self, sink: Arc<dyn TelemetrySink>) {
        self.sinks.push(sink);
    }
}

impl TelemetrySink for MultiplexTelemetrySink {
    fn emit(&self, event: TelemetryEvent) {
        for sink in &self.sinks {
            sink.emit(event.clone());
        }
    }
}

impl std::fmt::Debug for MultiplexTelemetrySink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiplexTelemetrySink")
            .field("sink_count", &self.sinks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn admitted(id: u64) -> TelemetryEvent {
        TelemetryEvent::RequestAdmitted {
            request_id: RequestId::new(id),
            queue_depth: 1,
        }
    }

    #[test]
    fn test_null_sink() {
        NullTelemetrySink.emit(admitted(1));
    }

    #[test]
    fn test_tracing_sink() {
        // Should not panic (a subscriber may or may not be installed)
        TracingTelemetrySink.emit(admitted(1));
        TracingTelemetrySink.emit(TelemetryEvent::WorkerStopped {
            reason: "test".to_string(),
            expected: false,
            processed: 0,
            drained: 0,
        });
    }

    #[test]
    fn test_event_request_id() {
        assert_eq!(admitted(5).request_id(), Some(RequestId::new(5)));
        assert_eq!(
            TelemetryEvent::WorkerStarted {
                construction_time: Duration::ZERO
            }
            .request_id(),
            None
        );
    }

    #[test]
    fn test_event_type_names() {
        assert_eq!(admitted(1).event_type(), "request_admitted");
        assert_eq!(
            TelemetryEvent::ComputeFailed {
                request_id: RequestId::new(1),
                duration: Duration::ZERO,
                message: "boom".to_string(),
            }
            .event_type(),
            "compute_failed"
        );
        assert_eq!(
            TelemetryEvent::EngineConstructionFailed {
                message: String::new()
            }
            .event_type(),
            "engine_construction_failed"
        );
    }

    #[test]
    fn test_multiplex_sink() {
        struct CountingSink(AtomicUsize);

        impl TelemetrySink for CountingSink {
            fn emit(&self, _event: TelemetryEvent) {
                self.0.fetch_add(1, Ordering::Relaxed);
            }
        }

        let sink1 = Arc::new(CountingSink(AtomicUsize::new(0)));
        let sink2 = Arc::new(CountingSink(AtomicUsize::new(0)));

        let mut multiplex =
            MultiplexTelemetrySink::new(vec![Arc::clone(&sink1) as Arc<dyn TelemetrySink>]);
        multiplex.add_sink(Arc::clone(&sink2) as Arc<dyn TelemetrySink>);

        multiplex.emit(admitted(1));
        multiplex.emit(admitted(2));

        assert_eq!(sink1.0.load(Ordering::Relaxed), 2);
        assert_eq!(sink2.0.load(Ordering::Relaxed), 2);
        assert!(format!("{:?}", multiplex).contains("sink_count: 2"));
    }
}
