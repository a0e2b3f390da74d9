//! Bounded admission queue.
//!
//! Producers hold cloneable [`AdmissionQueue`] handles and either admit an
//! envelope immediately or get [`AdmissionError::QueueFull`]; they never wait
//! for space. The worker loop exclusively owns the [`QueueReceiver`] and
//! blocks its own thread on it.
//!
//! Built on a bounded tokio `mpsc` channel. A slot is reserved atomically
//! with respect to other producers; the envelope becomes visible to the
//! worker only when the reserved [`AdmissionSlot`] is filled. Messages come
//! out in the order their slots were filled.

use super::envelope::Envelope;
use super::error::AdmissionError;
use std::num::NonZeroUsize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Creates a queue with a fixed capacity.
///
/// # Panics
///
/// Panics if `capacity` exceeds
/// [`MAX_QUEUE_CAPACITY`](super::MAX_QUEUE_CAPACITY);
/// [`GateConfig::validate`](super::GateConfig::validate) rejects such values.
pub fn admission_queue<P, R>(capacity: NonZeroUsize) -> (AdmissionQueue<P, R>, QueueReceiver<P, R>) {
    let (tx, rx) = mpsc::channel(capacity.get());
    (AdmissionQueue { tx }, QueueReceiver { rx })
}

// =============================================================================
// Producer side
// =============================================================================

/// Producer handle for the admission queue.
pub struct AdmissionQueue<P, R> {
    tx: mpsc::Sender<Envelope<P, R>>,
}

impl<P, R> Clone for AdmissionQueue<P, R> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<P, R> AdmissionQueue<P, R> {
    /// Admits the envelope or rejects it without blocking.
    ///
    /// On rejection the envelope is dropped, which closes its response
    /// channel; the caller learns about the rejection from the returned
    /// error and never waits on it.
    pub fn try_enqueue(&self, envelope: Envelope<P, R>) -> Result<(), AdmissionError> {
        self.try_reserve()?.fill(envelope);
        Ok(())
    }

    /// Reserves one slot without blocking.
    ///
    /// The slot counts towards [`depth`](Self::depth) while held, but the
    /// worker cannot see anything until it is filled. Dropping an unfilled
    /// slot gives the space back.
    pub fn try_reserve(&self) -> Result<AdmissionSlot<'_, P, R>, AdmissionError> {
        self.tx
            .try_reserve()
            .map(|permit| AdmissionSlot { permit })
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(()) => AdmissionError::QueueFull {
                    capacity: self.capacity(),
                },
                mpsc::error::TrySendError::Closed(()) => AdmissionError::WorkerUnavailable,
            })
    }

    /// Number of envelopes currently waiting (including slots being filled).
    pub fn depth(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    /// Fixed capacity chosen at creation.
    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }

    /// Current fill ratio between 0.0 (empty) and 1.0 (full).
    pub fn pressure(&self) -> f64 {
        self.depth() as f64 / self.capacity() as f64
    }

    /// Returns true once the worker side has gone away.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// A reserved queue slot; see [`AdmissionQueue::try_reserve`].
pub struct AdmissionSlot<'a, P, R> {
    permit: mpsc::Permit<'a, Envelope<P, R>>,
}

impl<P, R> AdmissionSlot<'_, P, R> {
    /// Hands the envelope to the worker. Never fails or blocks.
    pub fn fill(self, envelope: Envelope<P, R>) {
        self.permit.send(envelope);
    }
}

impl<P, R> std::fmt::Debug for AdmissionQueue<P, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdmissionQueue")
            .field("depth", &self.depth())
            .field("capacity", &self.capacity())
            .field("closed", &self.is_closed())
            .finish()
    }
}

// =============================================================================
// Consumer side
// =============================================================================

/// Result of a blocking dequeue.
#[derive(Debug)]
pub enum Dequeued<P, R> {
    /// Next envelope in admission order.
    Envelope(Envelope<P, R>),

    /// Shutdown was requested; queued envelopes are left for draining.
    Shutdown,

    /// Every producer handle was dropped and the queue is empty.
    Disconnected,
}

/// Consumer handle, owned by the worker loop alone.
pub struct QueueReceiver<P, R> {
    rx: mpsc::Receiver<Envelope<P, R>>,
}

impl<P, R> QueueReceiver<P, R> {
    /// Blocks the calling thread until an envelope is available or the
    /// shutdown token fires.
    ///
    /// Shutdown takes precedence over queued work. Must be called from a
    /// plain thread, not from inside an async runtime.
    pub fn dequeue_blocking(&mut self, shutdown: &CancellationToken) -> Dequeued<P, R> {
        futures::executor::block_on(async {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => Dequeued::Shutdown,

                next = self.rx.recv() => match next {
                    Some(envelope) => Dequeued::Envelope(envelope),
                    None => Dequeued::Disconnected,
                },
            }
        })
    }

    /// Closes the queue to new admissions and returns everything still
    /// waiting, oldest first.
    pub fn close_and_drain(&mut self) -> Vec<Envelope<P, R>> {
        self.rx.close();

        let mut drained = Vec::new();
        while let Ok(envelope) = self.rx.try_recv() {
            drained.push(envelope);
        }
        drained
    }
}

impl<P, R> std::fmt::Debug for QueueReceiver<P, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueReceiver").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::envelope::RequestId;
    use crate::gate::error::RequestError;

    fn capacity(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    fn envelope(id: u64) -> (Envelope<u64, u64>, crate::gate::ResponseChannel<u64>) {
        Envelope::new(RequestId::new(id), id)
    }

    #[test]
    fn test_rejects_when_full() {
        let (queue, _rx) = admission_queue::<u64, u64>(capacity(2));

        assert!(queue.try_enqueue(envelope(1).0).is_ok());
        assert!(queue.try_enqueue(envelope(2).0).is_ok());
        assert_eq!(
            queue.try_enqueue(envelope(3).0),
            Err(AdmissionError::QueueFull { capacity: 2 })
        );
        assert_eq!(queue.depth(), 2);
    }

    #[test]
    fn test_reserved_slot_counts_but_stays_hidden() {
        let (queue, mut rx) = admission_queue::<u64, u64>(capacity(1));
        let shutdown = CancellationToken::new();

        let slot = queue.try_reserve().unwrap();
        assert_eq!(queue.depth(), 1);
        assert!(matches!(
            queue.try_reserve(),
            Err(AdmissionError::QueueFull { capacity: 1 })
        ));

        drop(slot);
        assert_eq!(queue.depth(), 0);

        queue.try_reserve().unwrap().fill(envelope(7).0);
        match rx.dequeue_blocking(&shutdown) {
            Dequeued::Envelope(e) => assert_eq!(e.params, 7),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_space_frees_after_dequeue() {
        let (queue, mut rx) = admission_queue::<u64, u64>(capacity(1));
        let shutdown = CancellationToken::new();

        queue.try_enqueue(envelope(1).0).unwrap();
        assert!(queue.try_enqueue(envelope(2).0).is_err());

        assert!(matches!(rx.dequeue_blocking(&shutdown), Dequeued::Envelope(_)));
        assert!(queue.try_enqueue(envelope(3).0).is_ok());
    }

    #[test]
    fn test_fifo_order() {
        let (queue, mut rx) = admission_queue::<u64, u64>(capacity(8));
        let shutdown = CancellationToken::new();

        for id in 1..=5 {
            queue.try_enqueue(envelope(id).0).unwrap();
        }

        let order: Vec<u64> = (0..5)
            .map(|_| match rx.dequeue_blocking(&shutdown) {
                Dequeued::Envelope(e) => e.params,
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        assert_eq!(order, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_shutdown_wins_over_queued_work() {
        let (queue, mut rx) = admission_queue::<u64, u64>(capacity(4));
        let shutdown = CancellationToken::new();

        queue.try_enqueue(envelope(1).0).unwrap();
        shutdown.cancel();

        assert!(matches!(rx.dequeue_blocking(&shutdown), Dequeued::Shutdown));
        assert_eq!(rx.close_and_drain().len(), 1);
    }

    #[test]
    fn test_disconnected_when_producers_gone() {
        let (queue, mut rx) = admission_queue::<u64, u64>(capacity(4));
        drop(queue);

        let shutdown = CancellationToken::new();
        assert!(matches!(rx.dequeue_blocking(&shutdown), Dequeued::Disconnected));
    }

    #[test]
    fn test_dequeue_blocks_until_admission() {
        let (queue, mut rx) = admission_queue::<u64, u64>(capacity(4));
        let shutdown = CancellationToken::new();

        let producer = std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(30));
            queue.try_enqueue(envelope(7).0).unwrap();
            queue
        });

        match rx.dequeue_blocking(&shutdown) {
            Dequeued::Envelope(e) => assert_eq!(e.params, 7),
            other => panic!("unexpected {:?}", other),
        }
        let _queue = producer.join().unwrap();
    }

    #[test]
    fn test_close_rejects_new_admissions() {
        let (queue, mut rx) = admission_queue::<u64, u64>(capacity(4));
        queue.try_enqueue(envelope(1).0).unwrap();

        let drained = rx.close_and_drain();
        assert_eq!(drained.len(), 1);
        assert!(queue.is_closed());
        assert_eq!(
            queue.try_enqueue(envelope(2).0),
            Err(AdmissionError::WorkerUnavailable)
        );
    }

    #[tokio::test]
    async fn test_rejected_envelope_closes_its_channel() {
        let (queue, _rx) = admission_queue::<u64, u64>(capacity(1));
        queue.try_enqueue(envelope(1).0).unwrap();

        let (rejected, channel) = envelope(2);
        assert!(queue.try_enqueue(rejected).is_err());
        assert_eq!(channel.await_result().await, Err(RequestError::WorkerLost));
    }

    #[test]
    fn test_pressure() {
        let (queue, _rx) = admission_queue::<u64, u64>(capacity(4));
        assert_eq!(queue.pressure(), 0.0);

        queue.try_enqueue(envelope(1).0).unwrap();
        queue.try_enqueue(envelope(2).0).unwrap();
        assert!((queue.pressure() - 0.5).abs() < f64::EPSILON);
    }
}
