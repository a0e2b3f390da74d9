//! The worker loop: sole owner of the engine, sole consumer of the queue.
//!
//! Runs on a dedicated OS thread. Each iteration takes the oldest envelope,
//! runs the engine on it and delivers the outcome into that envelope's own
//! responder. A failing or panicking computation only fails its request; the
//! loop moves on to the next one.
//!
//! When the loop stops (shutdown requested, engine interrupted, or every
//! producer gone) it closes the queue and answers everything still waiting
//! with [`RequestError::ShutdownInFlight`].

use super::envelope::{Envelope, RequestId};
use super::error::RequestError;
use super::queue::{Dequeued, QueueReceiver};
use super::telemetry::{TelemetryEvent, TelemetrySink};
use crate::engine::{ComputeError, Engine};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

// =============================================================================
// Report
// =============================================================================

/// Why the worker loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerExit {
    /// Shutdown was requested through the service.
    Shutdown,

    /// Every client handle was dropped.
    Disconnected,

    /// The engine reported that its execution context was asked to stop.
    Interrupted,

    /// The worker thread panicked outside a computation.
    Panicked(String),
}

impl WorkerExit {
    /// Returns true if the loop ended for a reason the service initiated
    /// or allowed.
    pub fn is_expected(&self) -> bool {
        matches!(self, Self::Shutdown | Self::Disconnected)
    }
}

impl fmt::Display for WorkerExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shutdown => write!(f, "shutdown requested"),
            Self::Disconnected => write!(f, "all clients disconnected"),
            Self::Interrupted => write!(f, "engine interrupted"),
            Self::Panicked(message) => write!(f, "worker panicked: {}", message),
        }
    }
}

/// Summary of a finished worker loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerReport {
    /// Why the loop ended.
    pub exit: WorkerExit,

    /// Requests handed to the engine.
    pub processed: u64,

    /// Requests among `processed` that got an error outcome.
    pub failed: u64,

    /// Queued requests answered with `ShutdownInFlight` without computing.
    pub drained: usize,
}

impl WorkerReport {
    /// Report for a worker thread that died without producing one.
    pub(crate) fn lost(message: impl Into<String>) -> Self {
        Self {
            exit: WorkerExit::Panicked(message.into()),
            processed: 0,
            failed: 0,
            drained: 0,
        }
    }
}

// =============================================================================
// Worker Loop
// =============================================================================

enum Flow {
    Continue,
    Stop,
}

/// Single consumer of the admission queue.
pub(crate) struct WorkerLoop<E: Engine> {
    engine: E,
    queue: QueueReceiver<E::Params, E::Output>,
    shutdown: CancellationToken,
    telemetry: Arc<dyn TelemetrySink>,
    processed: u64,
    failed: u64,
}

impl<E: Engine> WorkerLoop<E> {
    pub(crate) fn new(
        engine: E,
        queue: QueueReceiver<E::Params, E::Output>,
        shutdown: CancellationToken,
        telemetry: Arc<dyn TelemetrySink>,
    ) -> Self {
        Self {
            engine,
            queue,
            shutdown,
            telemetry,
            processed: 0,
            failed: 0,
        }
    }

    /// Runs until shutdown, interruption or disconnection. Blocks the
    /// calling thread.
    pub(crate) fn run(mut self) -> WorkerReport {
        debug!("Worker loop running");

        let exit = loop {
            match self.queue.dequeue_blocking(&self.shutdown) {
                Dequeued::Envelope(envelope) => {
                    if let Flow::Stop = self.process(envelope) {
                        break WorkerExit::Interrupted;
                    }
                }
                Dequeued::Shutdown => break WorkerExit::Shutdown,
                Dequeued::Disconnected => break WorkerExit::Disconnected,
            }
        };

        let drained = self.drain();

        info!(
            exit = %exit,
            processed = self.processed,
            failed = self.failed,
            drained = drained,
            "Worker loop finished"
        );

        WorkerReport {
            exit,
            processed: self.processed,
            failed: self.failed,
            drained,
        }
    }

    fn process(&mut self, envelope: Envelope<E::Params, E::Output>) -> Flow {
        let Envelope {
            id,
            params,
            responder,
            created_at,
        } = envelope;

        let started = Instant::now();
        self.telemetry.emit(TelemetryEvent::RequestDequeued {
            request_id: id,
            wait_time: started.duration_since(created_at),
        });

        let engine = &mut self.engine;
        let result = panic::catch_unwind(AssertUnwindSafe(|| engine.compute(params)));
        let duration = started.elapsed();
        self.processed += 1;

        let (outcome, flow) = match result {
            Ok(Ok(output)) => {
                self.telemetry.emit(TelemetryEvent::ComputeSucceeded {
                    request_id: id,
                    duration,
                });
                (Ok(output), Flow::Continue)
            }
            Ok(Err(ComputeError::Failed(message))) => {
                warn!(request_id = %id, error = %message, "Compute failed");
                (self.fail(id, duration, message), Flow::Continue)
            }
            Ok(Err(ComputeError::Interrupted)) => {
                warn!(request_id = %id, "Engine interrupted, stopping worker loop");
                self.failed += 1;
                self.telemetry.emit(TelemetryEvent::ComputeFailed {
                    request_id: id,
                    duration,
                    message: ComputeError::Interrupted.to_string(),
                });
                (Err(RequestError::ShutdownInFlight), Flow::Stop)
            }
            Err(payload) => {
                let message = format!("engine panicked: {}", panic_message(&*payload));
                error!(request_id = %id, error = %message, "Compute panicked");
                (self.fail(id, duration, message), Flow::Continue)
            }
        };

        let delivered = responder.deliver(outcome);
        if !delivered {
            debug!(request_id = %id, "Caller stopped listening, result discarded");
        }
        self.telemetry.emit(TelemetryEvent::ResponseDelivered {
            request_id: id,
            delivered,
            total_time: created_at.elapsed(),
        });

        flow
    }

    fn fail(
        &mut self,
        id: RequestId,
        duration: Duration,
        message: String,
    ) -> Result<E::Output, RequestError> {
        self.failed += 1;
        self.telemetry.emit(TelemetryEvent::ComputeFailed {
            request_id: id,
            duration,
            message: message.clone(),
        });
        Err(RequestError::ComputeFailed { message })
    }

    fn drain(&mut self) -> usize {
        let pending = self.queue.close_and_drain();
        let count = pending.len();

        for envelope in pending {
            let delivered = envelope
                .responder
                .deliver(Err(RequestError::ShutdownInFlight));
            self.telemetry.emit(TelemetryEvent::ResponseDelivered {
                request_id: envelope.id,
                delivered,
                total_time: envelope.created_at.elapsed(),
            });
        }

        if count > 0 {
            info!(drained = count, "Answered pending requests with shutdown");
        }
        count
    }
}

/// Extracts a readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
