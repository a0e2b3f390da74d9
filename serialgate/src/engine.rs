//! Compute engine abstraction.
//!
//! The engine is the expensive, stateful resource that serialgate guards.
//! It is constructed once, on the worker thread, and never leaves it. That
//! is why neither [`Engine`] nor its state needs to be `Send` or `Sync`:
//! only the parameters flowing in and the outputs flowing out cross threads.
//!
//! # Example
//!
//! ```
//! use serialgate::engine::{ComputeError, ConstructError, Engine, EngineFactory};
//!
//! struct Doubler {
//!     calls: u64,
//! }
//!
//! impl Engine for Doubler {
//!     type Params = u64;
//!     type Output = u64;
//!
//!     fn compute(&mut self, params: u64) -> Result<u64, ComputeError> {
//!         self.calls += 1;
//!         params.checked_mul(2).ok_or_else(|| ComputeError::failed("overflow"))
//!     }
//! }
//!
//! // Closures returning an engine are factories.
//! let factory = || Ok::<_, ConstructError>(Doubler { calls: 0 });
//! let mut engine = factory.construct().unwrap();
//! assert_eq!(engine.compute(21).unwrap(), 42);
//! ```

use thiserror::Error;

/// A sequential computation engine that processes one request at a time.
///
/// `compute` may block for a long, unbounded time. The worker loop calls it
/// from its dedicated thread and never concurrently.
pub trait Engine: 'static {
    /// Request parameters, already validated by whoever submitted them.
    type Params: Send + 'static;

    /// Computed result handed back to the caller.
    type Output: Send + 'static;

    /// Runs one computation.
    ///
    /// Returning [`ComputeError::Failed`] fails only this request. Returning
    /// [`ComputeError::Interrupted`] tells the worker loop that the engine
    /// was asked to stop; the loop shuts down after answering everyone.
    fn compute(&mut self, params: Self::Params) -> Result<Self::Output, ComputeError>;
}

/// One-time constructor for an [`Engine`].
///
/// The factory is moved to the worker thread and consumed there, so
/// construction (loading weights, opening a device context, ...) happens
/// on the same thread that later calls `compute`.
pub trait EngineFactory: Send + 'static {
    /// The engine this factory builds.
    type Engine: Engine;

    /// Builds the engine. May be slow.
    fn construct(self) -> Result<Self::Engine, ConstructError>;
}

impl<F, E> EngineFactory for F
where
    F: FnOnce() -> Result<E, ConstructError> + Send + 'static,
    E: Engine,
{
    type Engine = E;

    fn construct(self) -> Result<E, ConstructError> {
        self()
    }
}

/// Failure reported by [`Engine::compute`] for a single request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComputeError {
    /// The engine could not produce a result for this request.
    #[error("{0}")]
    Failed(String),

    /// The engine's execution context was asked to stop.
    #[error("computation interrupted")]
    Interrupted,
}

impl ComputeError {
    /// Creates a request-scoped failure with the engine's message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Failure while constructing the engine. Fatal for the service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ConstructError {
    message: String,
}

impl ConstructError {
    /// Creates a construction error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the underlying message.
    pub fn message(&self) -> &str {
        &self.message
    }
}
