//! Run command - serve requests from stdin through the compute worker.
//!
//! Every non-empty input line is submitted as one request. Answers are
//! printed to stdout as they arrive, tagged with their request id.
//! Rejections are printed immediately. Logs go to the log file (and stderr,
//! when enabled).

use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use serialgate::gate::{
    AdmissionError, ComputeService, GateConfig, Outcome, RequestId, ServiceClient,
    TracingTelemetrySink, WorkerReport,
};
use serialgate::panic as panic_handler;

use crate::demo_engine::{DemoEngine, DemoSettings};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the run command.
#[derive(Default)]
pub struct RunArgs {
    pub config: Option<PathBuf>,
    pub capacity: Option<usize>,
    pub debug: bool,
}

/// Why input processing ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopReason {
    /// stdin reached end of file
    EndOfInput,
    /// Ctrl-C
    Interrupted,
    /// The worker ended on its own
    WorkerStopped,
    /// Reading stdin failed
    InputFailed,
}

/// Run the run command.
pub fn run(args: RunArgs) -> Result<(), CliError> {
    // Initialize panic handler early so worker panics reach the log
    panic_handler::init();

    let runner = CliRunner::with_options(args.config.as_deref(), args.capacity, args.debug)?;
    runner.log_startup("run");
    let config = runner.config();

    let settings = DemoSettings::from_config(&config.engine)?;

    // stdout carries answers only
    eprintln!("serialgate v{}", serialgate::VERSION);
    eprintln!("{}", "=".repeat(40));
    eprintln!("Queue capacity: {}", config.queue.capacity);
    eprintln!("Worker thread:  {}", config.worker.thread_name);
    eprintln!("Engine mode:    {:?}", settings.mode);
    eprintln!("Log file:       {}", config.logging.file.display());
    eprintln!();

    let interrupt = CancellationToken::new();
    let interrupt_handler = interrupt.clone();
    ctrlc::set_handler(move || interrupt_handler.cancel())
        .map_err(|e| CliError::SignalHandler(e.to_string()))?;

    let (service, client) = ComputeService::start(
        GateConfig::from(config),
        move || DemoEngine::load(settings),
        Arc::new(TracingTelemetrySink),
    )?;

    eprintln!("Ready. One request per line; Ctrl-D to finish, Ctrl-C to stop.");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let stdin = BufReader::new(tokio::io::stdin());
    let served = runtime.block_on(serve(stdin, client, &service, interrupt));
    // A pending stdin read cannot be cancelled; don't wait for it.
    runtime.shutdown_background();

    if let Err(e) = &served {
        warn!(error = %e, "Input processing failed, shutting down");
        service.request_shutdown();
    }

    let report = service.join();
    print_report(&report);

    served?;
    if report.exit.is_expected() {
        Ok(())
    } else {
        Err(CliError::WorkerTerminated(report.exit))
    }
}

/// Submits each input line and prints answers until input ends, the user
/// interrupts, or the worker stops.
///
/// Returns once every admitted request has been answered, including when
/// reading the input fails part way. Shutdown has been requested by then.
async fn serve<I>(
    input: I,
    client: ServiceClient<String, String>,
    service: &ComputeService,
    interrupt: CancellationToken,
) -> Result<StopReason, CliError>
where
    I: AsyncBufRead + Unpin,
{
    let terminated = service.terminated();
    let mut lines = input.lines();
    let mut pending = JoinSet::new();
    let mut input_error = None;

    let reason = loop {
        tokio::select! {
            biased;

            _ = interrupt.cancelled() => break StopReason::Interrupted,
            _ = terminated.cancelled() => break StopReason::WorkerStopped,
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break StopReason::EndOfInput,
                    Err(e) => {
                        input_error = Some(e);
                        break StopReason::InputFailed;
                    }
                };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                match client.submit(line.to_string()) {
                    Ok(channel) => {
                        pending.spawn(async move {
                            let id = channel.request_id();
                            let outcome = channel.await_result().await;
                            println!("{}", render_outcome(id, &outcome));
                        });
                    }
                    Err(e) => println!("{}", render_rejection(&e)),
                }
            }
        }
    };

    info!(reason = ?reason, outstanding = pending.len(), "Input finished");

    let mut shutdown_requested = false;
    if reason == StopReason::Interrupted {
        service.request_shutdown();
        shutdown_requested = true;
    }

    // Outstanding requests still get answered; Ctrl-C here cuts the queue short.
    loop {
        tokio::select! {
            joined = pending.join_next() => {
                if joined.is_none() {
                    break;
                }
            }
            _ = interrupt.cancelled(), if !shutdown_requested => {
                service.request_shutdown();
                shutdown_requested = true;
            }
        }
    }

    service.request_shutdown();
    match input_error {
        Some(e) => Err(e.into()),
        None => Ok(reason),
    }
}

fn render_outcome(id: RequestId, outcome: &Outcome<String>) -> String {
    match outcome {
        Ok(answer) => format!("[{}] {}", id, answer),
        Err(e) => format!("[{}] error: {}", id, e),
    }
}

fn render_rejection(error: &AdmissionError) -> String {
    format!("rejected: {}", error)
}

fn print_report(report: &WorkerReport) {
    eprintln!();
    eprintln!("Worker stopped: {}", report.exit);
    eprintln!("  Processed: {} ({} failed)", report.processed, report.failed);
    eprintln!("  Drained:   {}", report.drained);
}
