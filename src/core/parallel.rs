//! Parallel extension execution.
//!
//! Every registered extension runs on a worker of a bounded pool against its
//! own fresh [`Report`]. Work is handed out over a job channel carrying only
//! extension identifiers, and finished reports come back over a result
//! channel. A failing or panicking extension is recorded as an error element
//! in its own report and never affects the others.
//!
//! With the default [`Isolation::Thread`] only unwinding panics are
//! contained: an abort, stack overflow or `process::exit` inside an extension
//! still ends the whole process. [`Isolation::Process`] moves each extension
//! into a child process so such crashes stay local to it.
//!
//! There is no per-extension timeout: a hung extension keeps its worker busy
//! and [`ParallelExecutor::run_all`] waits for it. Callers that need a
//! wall-clock bound must impose it around the whole run.

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Instant;

use parking_lot::Mutex;

use super::{
    Element, Extension, ExtensionContext, ExtensionId, ExtensionRegistry, Isolation, Report,
    ReportError, ReportResult,
};

/// Per-extension reports produced by a run, keyed by extension identifier.
pub type ExtensionReports = BTreeMap<ExtensionId, Report>;

/// Runs extensions concurrently on a pool of worker threads.
#[derive(Debug, Clone)]
pub struct ParallelExecutor {
    /// Maximum number of worker threads
    max_workers: usize,

    /// Where each extension runs
    isolation: Isolation,
}

impl Default for ParallelExecutor {
    fn default() -> Self {
        Self { max_workers: num_cpus::get().max(1), isolation: Isolation::Thread }
    }
}

impl ParallelExecutor {
    /// Create an executor sized to the available parallelism.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of workers. Zero keeps the automatic size.
    #[must_use]
    pub fn max_workers(mut self, max: usize) -> Self {
        if max > 0 {
            self.max_workers = max;
        }
        self
    }

    /// Set where extensions run.
    #[must_use]
    pub fn isolation(mut self, isolation: Isolation) -> Self {
        self.isolation = isolation;
        self
    }

    /// Configured worker limit.
    pub fn worker_limit(&self) -> usize {
        self.max_workers
    }

    /// Run every extension in `registry` and wait for all of them.
    ///
    /// Always yields one report per extension. Only infrastructure problems,
    /// such as failing to start a worker thread, are returned as errors.
    pub fn run_all(
        &self,
        registry: &ExtensionRegistry,
        ctx: &ExtensionContext,
    ) -> ReportResult<ExtensionReports> {
        let start = Instant::now();

        if registry.is_empty() {
            return Ok(BTreeMap::new());
        }

        let (job_tx, job_rx) = mpsc::channel::<ExtensionId>();
        for id in registry.ids() {
            // The receiver is still in scope, so the queue cannot be closed
            job_tx.send(id.clone()).map_err(|e| ReportError::Dispatch(e.0))?;
        }
        // Workers stop once the queue is drained
        drop(job_tx);

        let jobs = Mutex::new(job_rx);
        let (result_tx, result_rx) = mpsc::channel::<(ExtensionId, Report)>();
        let workers = self.max_workers.min(registry.len());

        thread::scope(|scope| -> ReportResult<()> {
            let mut handles = Vec::with_capacity(workers);
            for index in 0..workers {
                let results = result_tx.clone();
                let jobs = &jobs;
                let isolation = &self.isolation;
                let handle = thread::Builder::new()
                    .name(format!("gtd-report-{index}"))
                    .spawn_scoped(scope, move || {
                        worker_loop(jobs, &results, registry, ctx, isolation);
                    })
                    .map_err(ReportError::WorkerPool)?;
                handles.push(handle);
            }

            for handle in handles {
                handle.join().map_err(|_| ReportError::WorkerPanicked)?;
            }
            Ok(())
        })?;

        let reports: ExtensionReports = result_rx.try_iter().collect();

        for id in registry.ids() {
            if !reports.contains_key(id) {
                return Err(ReportError::MissingResult(id.clone()));
            }
        }

        tracing::info!(
            extensions = reports.len(),
            failed = reports.values().filter(|r| r.has_error()).count(),
            workers,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Extensions finished"
        );

        Ok(reports)
    }
}

/// Pull identifiers off the job queue until it is empty.
fn worker_loop(
    jobs: &Mutex<Receiver<ExtensionId>>,
    results: &Sender<(ExtensionId, Report)>,
    registry: &ExtensionRegistry,
    ctx: &ExtensionContext,
    isolation: &Isolation,
) {
    loop {
        let next = jobs.lock().recv();
        let Ok(id) = next else {
            break;
        };

        let Some(extension) = registry.get(&id) else {
            continue;
        };

        let report = match isolation {
            Isolation::Thread => run_extension(&id, extension.as_ref(), ctx),
            Isolation::Process(runner) => runner.run(&id),
        };
        if results.send((id, report)).is_err() {
            break;
        }
    }
}

/// Run one extension in the current process, converting any failure into an
/// error element.
pub fn run_extension(
    id: &ExtensionId,
    extension: &dyn Extension,
    ctx: &ExtensionContext,
) -> Report {
    let start = Instant::now();
    let mut report = Report::new();

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| extension.run(ctx, &mut report)));

    let failure = match outcome {
        Ok(Ok(())) => None,
        Ok(Err(e)) => Some(format!("{e:#}")),
        Err(payload) => Some(panic_message(payload.as_ref())),
    };

    match failure {
        None => {
            tracing::debug!(
                extension = %id,
                elements = report.len(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Extension completed"
            );
        }
        Some(message) => {
            tracing::warn!(extension = %id, error = %message, "Extension failed");
            report.add(Element::error(message));
        }
    }

    report
}

/// Extract a readable message from a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned());

    match detail {
        Some(detail) => format!("extension panicked: {detail}"),
        None => "extension panicked".to_string(),
    }
}
