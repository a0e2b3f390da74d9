//! Service lifecycle: engine construction, worker spawn, supervision and
//! shutdown.
//!
//! [`ComputeService::start`] builds the engine on the worker thread and only
//! hands out a [`ServiceClient`] once construction succeeded. The returned
//! service owns the shutdown switch and the supervisor's join handle.

use super::client::ServiceClient;
use super::config::GateConfig;
use super::error::ServiceError;
use super::queue::admission_queue;
use super::supervisor::{spawn_supervisor, Supervision};
use super::telemetry::{TelemetryEvent, TelemetrySink};
use super::worker::{panic_message, WorkerLoop, WorkerReport};
use crate::engine::{ConstructError, Engine, EngineFactory};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Parameters accepted by the engine a factory builds.
pub type FactoryParams<F> = <<F as EngineFactory>::Engine as Engine>::Params;

/// Output produced by the engine a factory builds.
pub type FactoryOutput<F> = <<F as EngineFactory>::Engine as Engine>::Output;

/// The running compute service.
///
/// Owns the worker's lifecycle, not its traffic: requests go through
/// [`ServiceClient`]s. Dropping the service requests shutdown without
/// waiting for the worker; call [`shutdown`](Self::shutdown) to wait.
pub struct ComputeService {
    thread_name: String,
    shutdown: CancellationToken,
    terminated: CancellationToken,
    supervisor: Option<JoinHandle<WorkerReport>>,
}

impl ComputeService {
    /// Starts the worker and returns the service together with the first
    /// client.
    ///
    /// Blocks until the engine has been constructed on the worker thread.
    /// Construction errors and panics are returned as
    /// [`ServiceError::EngineConstruction`]; in that case no request was
    /// ever admitted.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use serialgate::gate::{ComputeService, GateConfig, TracingTelemetrySink};
    /// use std::sync::Arc;
    ///
    /// let (service, client) = ComputeService::start(
    ///     GateConfig::with_capacity(16),
    ///     || MyEngine::load("weights.bin"),
    ///     Arc::new(TracingTelemetrySink),
    /// )?;
    ///
    /// let answer = client.call_blocking(prompt)?;
    /// let report = service.shutdown();
    /// ```
    #[allow(clippy::type_complexity)]
    pub fn start<F>(
        config: GateConfig,
        factory: F,
        telemetry: Arc<dyn TelemetrySink>,
    ) -> Result<(Self, ServiceClient<FactoryParams<F>, FactoryOutput<F>>), ServiceError>
    where
        F: EngineFactory,
    {
        let capacity = config.validate()?;
        let (queue, receiver) = admission_queue(capacity);
        let shutdown = CancellationToken::new();
        let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<(), ConstructError>>(1);

        let worker = {
            let shutdown = shutdown.clone();
            let telemetry = Arc::clone(&telemetry);
            thread::Builder::new()
                .name(config.worker_thread_name.clone())
                .spawn(move || {
                    let started = Instant::now();
                    let engine = match panic::catch_unwind(AssertUnwindSafe(|| factory.construct())) {
                        Ok(Ok(engine)) => engine,
                        Ok(Err(e)) => {
                            let _ = ready_tx.send(Err(e));
                            return None;
                        }
                        Err(payload) => {
                            let message = format!(
                                "engine constructor panicked: {}",
                                panic_message(&*payload)
                            );
                            let _ = ready_tx.send(Err(ConstructError::new(message)));
                            return None;
                        }
                    };

                    telemetry.emit(TelemetryEvent::WorkerStarted {
                        construction_time: started.elapsed(),
                    });
                    let _ = ready_tx.send(Ok(()));

                    Some(WorkerLoop::new(engine, receiver, shutdown, telemetry).run())
                })
                .map_err(|source| ServiceError::Spawn {
                    thread: config.worker_thread_name.clone(),
                    source,
                })?
        };

        let construction = ready_rx.recv().unwrap_or_else(|_| {
            Err(ConstructError::new(
                "worker thread exited during engine construction",
            ))
        });
        if let Err(e) = construction {
            error!(error = %e, "Engine construction failed");
            telemetry.emit(TelemetryEvent::EngineConstructionFailed {
                message: e.to_string(),
            });
            if worker.join().is_err() {
                debug!("Worker thread panicked after failed construction");
            }
            return Err(ServiceError::EngineConstruction(e));
        }

        let terminated = CancellationToken::new();
        let supervisor_name = format!("{}-supervisor", config.worker_thread_name);
        let supervisor = spawn_supervisor(
            supervisor_name.clone(),
            worker,
            Supervision {
                shutdown: shutdown.clone(),
                terminated: terminated.clone(),
                telemetry: Arc::clone(&telemetry),
            },
        )
        .map_err(|source| {
            // Stop the orphaned worker.
            shutdown.cancel();
            ServiceError::Spawn {
                thread: supervisor_name,
                source,
            }
        })?;

        info!(
            thread = %config.worker_thread_name,
            queue_capacity = capacity.get(),
            "Compute service started"
        );

        let service = Self {
            thread_name: config.worker_thread_name,
            shutdown,
            terminated,
            supervisor: Some(supervisor),
        };
        Ok((service, ServiceClient::new(queue, telemetry)))
    }

    /// Asks the worker loop to stop. Non-blocking.
    ///
    /// A computation in progress runs to completion and its caller gets the
    /// real result; everything still queued is answered with
    /// `ShutdownInFlight`.
    pub fn request_shutdown(&self) {
        if !self.shutdown.is_cancelled() {
            debug!(thread = %self.thread_name, "Shutdown requested");
        }
        self.shutdown.cancel();
    }

    /// Waits for the worker loop to end and returns its report.
    ///
    /// Does not request shutdown; without [`request_shutdown`](Self::request_shutdown)
    /// this returns only after every client is dropped or the worker
    /// terminates on its own. Blocks the calling thread.
    pub fn join(mut self) -> WorkerReport {
        self.wait()
    }

    /// Requests shutdown and waits for the worker loop to end.
    pub fn shutdown(mut self) -> WorkerReport {
        self.request_shutdown();
        self.wait()
    }

    /// Returns true while the worker loop is alive.
    pub fn is_running(&self) -> bool {
        !self.terminated.is_cancelled()
    }

    /// Token cancelled once the worker loop has terminated, for any reason.
    ///
    /// Await `terminated().cancelled()` next to the transport's own futures
    /// to notice a worker that died underneath it.
    pub fn terminated(&self) -> CancellationToken {
        self.terminated.clone()
    }

    /// Name of the worker thread.
    pub fn thread_name(&self) -> &str {
        &self.thread_name
    }

    fn wait(&mut self) -> WorkerReport {
        match self.supervisor.take() {
            Some(handle) => handle
                .join()
                .unwrap_or_else(|payload| WorkerReport::lost(panic_message(&*payload))),
            None => WorkerReport::lost("worker already joined"),
        }
    }
}

impl Drop for ComputeService {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

impl std::fmt::Debug for ComputeService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComputeService")
            .field("thread_name", &self.thread_name)
            .field("running", &self.is_running())
            .field("shutdown_requested", &self.shutdown.is_cancelled())
            .finish()
    }
}
