//! Admission, serialization and response routing for a single compute engine.
//!
//! Many concurrent callers share one engine that can only run one request at
//! a time. The gate funnels them through a bounded queue into a single worker
//! thread and hands each caller exactly the outcome of its own request.
//!
//! # Architecture
//!
//! ```text
//!  callers (tasks / threads)            worker thread ("compute-worker")
//!  ─────────────────────────            ───────────────────────────────
//!  ServiceClient::submit(params)
//!     │ Envelope { id, params, Responder }
//!     ▼
//!  AdmissionQueue::try_enqueue ──► [ bounded FIFO ] ──► QueueReceiver
//!     │ full → AdmissionError::QueueFull                   │
//!     ▼                                                    ▼
//!  ResponseChannel ◄──────── Responder::deliver ◄──── Engine::compute
//!                                                          │
//!                         supervisor thread ◄── join ──────┘
//!                         (report, terminated token)
//! ```
//!
//! # Guarantees
//!
//! - At most one `compute` runs at any time, always on the worker thread.
//! - Requests are computed in admission order.
//! - Admission never blocks; beyond capacity it fails immediately.
//! - Every admitted request is answered exactly once, with its own result
//!   or an error. A worker that dies without answering closes the channel,
//!   which callers observe as [`RequestError::WorkerLost`].
//! - A failing or panicking computation only fails its own request.
//!
//! # Example
//!
//! ```
//! use serialgate::engine::{ComputeError, ConstructError, Engine};
//! use serialgate::gate::{ComputeService, GateConfig, NullTelemetrySink};
//! use std::sync::Arc;
//!
//! struct Upper;
//!
//! impl Engine for Upper {
//!     type Params = String;
//!     type Output = String;
//!
//!     fn compute(&mut self, params: String) -> Result<String, ComputeError> {
//!         Ok(params.to_uppercase())
//!     }
//! }
//!
//! let (service, client) = ComputeService::start(
//!     GateConfig::with_capacity(8),
//!     || Ok::<_, ConstructError>(Upper),
//!     Arc::new(NullTelemetrySink),
//! )
//! .unwrap();
//!
//! assert_eq!(client.call_blocking("x".to_string()).unwrap(), "X");
//! service.shutdown();
//! ```

mod client;
mod config;
mod envelope;
mod error;
mod lifecycle;
mod queue;
mod response;
mod supervisor;
mod telemetry;
mod worker;

pub use client::ServiceClient;
pub use config::{
    GateConfig, DEFAULT_QUEUE_CAPACITY, DEFAULT_WORKER_THREAD_NAME, MAX_QUEUE_CAPACITY,
};
pub use envelope::{Envelope, RequestId};
pub use error::{AdmissionError, CallError, Outcome, RequestError, ServiceError};
pub use lifecycle::{ComputeService, FactoryOutput, FactoryParams};
pub use queue::{admission_queue, AdmissionQueue, AdmissionSlot, Dequeued, QueueReceiver};
pub use response::{Responder, ResponseChannel};
pub use telemetry::{
    MultiplexTelemetrySink, NullTelemetrySink, TelemetryEvent, TelemetrySink,
    TracingTelemetrySink,
};
pub use worker::{WorkerExit, WorkerReport};
