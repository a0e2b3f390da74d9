//! Request envelope: caller parameters bound to their response destination.

use super::response::{response_pair, Responder, ResponseChannel};
use std::fmt;
use std::time::{Duration, Instant};

// =============================================================================
// Request Id
// =============================================================================

/// Identifier assigned to a request when its envelope is created.
///
/// Only used for logs and telemetry; routing relies on the envelope owning
/// its responder, never on id lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

impl RequestId {
    /// Wraps a raw sequence number.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw sequence number.
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

// =============================================================================
// Envelope
// =============================================================================

/// The unit flowing through the admission queue.
///
/// Created by a producer at call time, consumed by the worker loop. The
/// responder inside is the only way to answer the caller holding the
/// matching [`ResponseChannel`].
pub struct Envelope<P, R> {
    /// Request identifier.
    pub id: RequestId,

    /// Engine parameters, passed through untouched.
    pub params: P,

    /// Sending half of this request's response channel.
    pub responder: Responder<R>,

    /// When the envelope was created (just before admission).
    pub created_at: Instant,
}

impl<P, R> Envelope<P, R> {
    /// Creates an envelope and the response channel its caller will wait on.
    pub fn new(id: RequestId, params: P) -> (Self, ResponseChannel<R>) {
        let (responder, channel) = response_pair(id);
        let envelope = Self {
            id,
            params,
            responder,
            created_at: Instant::now(),
        };
        (envelope, channel)
    }

    /// Time spent since the envelope was created.
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }
}

impl<P, R> fmt::Debug for Envelope<P, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("id", &self.id)
            .field("abandoned", &self.responder.is_abandoned())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::error::RequestError;

    #[test]
    fn test_request_id_display() {
        assert_eq!(RequestId::new(42).to_string(), "req-42");
        assert_eq!(RequestId::new(42).value(), 42);
    }

    #[test]
    fn test_request_id_ordering() {
        assert!(RequestId::new(1) < RequestId::new(2));
    }

    #[tokio::test]
    async fn test_envelope_is_bound_to_its_channel() {
        let (first, first_rx) = Envelope::<&str, String>::new(RequestId::new(1), "a");
        let (second, second_rx) = Envelope::<&str, String>::new(RequestId::new(2), "b");

        // Answer in reverse order; each caller still sees its own result.
        second.responder.deliver(Ok(second.params.to_uppercase()));
        first.responder.deliver(Ok(first.params.to_uppercase()));

        assert_eq!(first_rx.await_result().await, Ok("A".to_string()));
        assert_eq!(second_rx.await_result().await, Ok("B".to_string()));
    }

    #[tokio::test]
    async fn test_dropped_envelope_unblocks_caller() {
        let (envelope, channel) = Envelope::<u8, u8>::new(RequestId::new(9), 0);
        drop(envelope);
        assert_eq!(channel.await_result().await, Err(RequestError::WorkerLost));
    }

    #[test]
    fn test_envelope_debug_hides_params() {
        let (envelope, _channel) = Envelope::<String, String>::new(RequestId::new(3), "secret".into());
        let debug = format!("{:?}", envelope);
        assert!(debug.contains("RequestId(3)"));
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn test_envelope_age_counts_from_creation() {
        let (mut envelope, _channel) = Envelope::<u8, u8>::new(RequestId::new(4), 0);
        envelope.created_at -= Duration::from_millis(250);
        assert!(envelope.age() >= Duration::from_millis(250));
    }
}
