//! Caller-facing handle.
//!
//! [`ServiceClient`] is what transport handlers hold. It is cheap to clone;
//! every clone feeds the same bounded queue and draws request ids from the
//! same sequence. Admission is always immediate: a full queue is reported
//! as [`AdmissionError::QueueFull`], never waited out.

use super::envelope::{Envelope, RequestId};
use super::error::{AdmissionError, CallError};
use super::queue::AdmissionQueue;
use super::response::ResponseChannel;
use super::telemetry::{TelemetryEvent, TelemetrySink};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Submits requests to the compute worker.
///
/// Clients are the only producers: once every clone is dropped the worker
/// loop finishes with the queue empty. Stopping or dropping the owning
/// [`ComputeService`](super::ComputeService) ends the worker regardless of
/// live clients, after which `submit` reports `WorkerUnavailable`.
pub struct ServiceClient<P, R> {
    queue: AdmissionQueue<P, R>,
    next_id: Arc<AtomicU64>,
    telemetry: Arc<dyn TelemetrySink>,
}

impl<P, R> Clone for ServiceClient<P, R> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
            next_id: Arc::clone(&self.next_id),
            telemetry: Arc::clone(&self.telemetry),
        }
    }
}

impl<P, R> ServiceClient<P, R> {
    pub(crate) fn new(queue: AdmissionQueue<P, R>, telemetry: Arc<dyn TelemetrySink>) -> Self {
        Self {
            queue,
            next_id: Arc::new(AtomicU64::new(1)),
            telemetry,
        }
    }

    /// Tries to admit a request.
    ///
    /// On success the returned channel resolves exactly once with the
    /// outcome for these parameters. On rejection nothing was queued and
    /// there is nothing to wait for.
    pub fn submit(&self, params: P) -> Result<ResponseChannel<R>, AdmissionError> {
        let id = RequestId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (envelope, channel) = Envelope::new(id, params);

        let slot = match self.queue.try_reserve() {
            Ok(slot) => slot,
            Err(e) => {
                debug!(request_id = %id, error = %e, "Admission refused");
                self.telemetry.emit(TelemetryEvent::RequestRejected {
                    request_id: id,
                    queue_full: e.is_queue_full(),
                    queue_depth: self.queue.depth(),
                });
                return Err(e);
            }
        };

        // Recorded before the worker can see the envelope.
        self.telemetry.emit(TelemetryEvent::RequestAdmitted {
            request_id: id,
            queue_depth: self.queue.depth(),
        });
        slot.fill(envelope);
        Ok(channel)
    }

    /// Submits and awaits the outcome.
    pub async fn call(&self, params: P) -> Result<R, CallError> {
        let channel = self.submit(params)?;
        Ok(channel.await_result().await?)
    }

    /// Submits and blocks the current thread until the outcome arrives.
    ///
    /// # Panics
    ///
    /// Panics when called from within an async runtime; use
    /// [`call`](Self::call) there.
    pub fn call_blocking(&self, params: P) -> Result<R, CallError> {
        let channel = self.submit(params)?;
        Ok(channel.wait_blocking()?)
    }

    /// Requests currently waiting in the queue.
    pub fn queue_depth(&self) -> usize {
        self.queue.depth()
    }

    /// Fixed queue capacity.
    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// Queue fill ratio (0.0 to 1.0).
    pub fn pressure(&self) -> f64 {
        self.queue.pressure()
    }

    /// Returns false once the worker loop has stopped accepting requests.
    pub fn is_connected(&self) -> bool {
        !self.queue.is_closed()
    }
}

impl<P, R> std::fmt::Debug for ServiceClient<P, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceClient")
            .field("queue", &self.queue)
            .field("next_id", &self.next_id.load(Ordering::Relaxed))
            .finish()
    }
}
