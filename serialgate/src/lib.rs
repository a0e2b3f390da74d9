//! serialgate - serialized access to a single expensive compute engine
//!
//! This library puts one stateful, strictly sequential computation engine
//! (a model, a solver, a device context) behind a request/response
//! interface that any number of concurrent callers can use.
//!
//! # High-Level API
//!
//! The [`gate`] module is the core: a bounded admission queue, a single
//! worker thread that owns the engine, and a per-request response channel.
//!
//! ```ignore
//! use serialgate::gate::{ComputeService, GateConfig, TracingTelemetrySink};
//! use std::sync::Arc;
//!
//! let (service, client) = ComputeService::start(
//!     GateConfig::default(),
//!     || MyEngine::load(),
//!     Arc::new(TracingTelemetrySink),
//! )?;
//!
//! // From any task: admitted immediately or rejected with QueueFull.
//! let answer = client.call(params).await?;
//! ```
//!
//! Supporting modules:
//! - [`engine`] - the engine and factory traits implemented by users
//! - [`config`] - INI configuration file and environment overrides
//! - [`logging`] - tracing subscriber with a file trace destination
//! - [`panic`] - panic hook reporting through tracing and stderr

pub mod config;
pub mod engine;
pub mod gate;
pub mod logging;
pub mod panic;

/// Version of the serialgate library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
