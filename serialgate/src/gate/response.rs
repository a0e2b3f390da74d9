//! Single-use response handoff between the worker loop and one caller.
//!
//! Each admitted request owns a fresh oneshot channel. The worker holds the
//! [`Responder`] (sending half) inside the request envelope, the caller holds
//! the [`ResponseChannel`] (receiving half). Both halves are consumed by the
//! single operation they support, so a second write or a second read does
//! not compile.
//!
//! ```text
//!  caller                              worker loop
//!  ──────                              ───────────
//!  submit(params) ──► Envelope { Responder } ──► compute
//!       │                                          │
//!  ResponseChannel ◄──────── deliver(outcome) ─────┘
//! ```

use super::envelope::RequestId;
use super::error::{Outcome, RequestError};
use tokio::sync::oneshot;

/// Creates a connected responder / response channel pair for one request.
pub(crate) fn response_pair<R>(request_id: RequestId) -> (Responder<R>, ResponseChannel<R>) {
    let (tx, rx) = oneshot::channel();
    (
        Responder { request_id, tx },
        ResponseChannel { request_id, rx },
    )
}

// =============================================================================
// Responder
// =============================================================================

/// Sending half, owned by the request envelope and consumed by the worker.
pub struct Responder<R> {
    request_id: RequestId,
    tx: oneshot::Sender<Outcome<R>>,
}

impl<R> Responder<R> {
    /// Delivers the outcome to the waiting caller.
    ///
    /// Never blocks. Returns `false` if the caller stopped listening (for
    /// example a transport timeout dropped its [`ResponseChannel`]); the
    /// outcome is discarded in that case.
    pub fn deliver(self, outcome: Outcome<R>) -> bool {
        self.tx.send(outcome).is_ok()
    }

    /// Returns true if the caller has dropped its receiving half.
    pub fn is_abandoned(&self) -> bool {
        self.tx.is_closed()
    }

    /// Identifier of the request this responder answers.
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }
}

impl<R> std::fmt::Debug for Responder<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Responder")
            .field("request_id", &self.request_id)
            .field("abandoned", &self.is_abandoned())
            .finish()
    }
}

// =============================================================================
// Response Channel
// =============================================================================

/// Receiving half handed to the caller after a successful admission.
///
/// Dropping it is allowed at any time; the worker still computes the
/// request but its result is discarded.
pub struct ResponseChannel<R> {
    request_id: RequestId,
    rx: oneshot::Receiver<Outcome<R>>,
}

impl<R> ResponseChannel<R> {
    /// Waits for the worker to answer this request.
    ///
    /// Resolves exactly once with either the computed result or the error
    /// outcome for this request. If the worker thread died before
    /// answering, resolves with [`RequestError::WorkerLost`].
    pub async fn await_result(self) -> Outcome<R> {
        self.rx.await.unwrap_or(Err(RequestError::WorkerLost))
    }

    /// Blocking variant of [`await_result`](Self::await_result) for callers
    /// on plain threads.
    ///
    /// # Panics
    ///
    /// Panics if called from within an asynchronous execution context
    /// (tokio forbids blocking a runtime thread this way). Use
    /// `await_result` there instead.
    pub fn wait_blocking(self) -> Outcome<R> {
        self.rx.blocking_recv().unwrap_or(Err(RequestError::WorkerLost))
    }

    /// Returns the outcome if it has already been delivered, `None` while
    /// the request is still pending.
    ///
    /// Once an outcome has been returned the channel is spent; further
    /// calls report [`RequestError::WorkerLost`].
    pub fn try_result(&mut self) -> Option<Outcome<R>> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(RequestError::WorkerLost)),
        }
    }

    /// Identifier assigned to this request at admission.
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }
}

impl<R> std::fmt::Debug for ResponseChannel<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseChannel")
            .field("request_id", &self.request_id)
            .finish()
    }
}
