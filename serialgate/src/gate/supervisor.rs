//! Worker supervision.
//!
//! The supervisor is a small thread that joins the worker thread and turns
//! its end into a [`WorkerReport`], whether the loop returned normally or the
//! thread died. An end nobody asked for is logged at error level and
//! signalled through the `terminated` token so the embedding process can
//! treat it as fatal.

use super::telemetry::{TelemetryEvent, TelemetrySink};
use super::worker::{panic_message, WorkerReport};
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Handles the supervisor needs besides the worker thread itself.
pub(crate) struct Supervision {
    pub shutdown: CancellationToken,
    pub terminated: CancellationToken,
    pub telemetry: Arc<dyn TelemetrySink>,
}

/// Spawns the supervisor for an already running worker thread.
pub(crate) fn spawn_supervisor(
    name: String,
    worker: JoinHandle<Option<WorkerReport>>,
    supervision: Supervision,
) -> io::Result<JoinHandle<WorkerReport>> {
    thread::Builder::new()
        .name(name)
        .spawn(move || supervise(worker, supervision))
}

fn supervise(worker: JoinHandle<Option<WorkerReport>>, supervision: Supervision) -> WorkerReport {
    let Supervision {
        shutdown,
        terminated,
        telemetry,
    } = supervision;

    let report = match worker.join() {
        Ok(Some(report)) => report,
        Ok(None) => WorkerReport::lost("worker exited before running"),
        Err(payload) => WorkerReport::lost(panic_message(&*payload)),
    };

    let expected = report.exit.is_expected() || shutdown.is_cancelled();
    if expected {
        info!(exit = %report.exit, "Compute worker terminated");
    } else {
        error!(
            exit = %report.exit,
            processed = report.processed,
            "Compute worker terminated unexpectedly"
        );
    }

    telemetry.emit(TelemetryEvent::WorkerStopped {
        reason: report.exit.to_string(),
        expected,
        processed: report.processed,
        drained: report.drained,
    });

    terminated.cancel();
    report
}
