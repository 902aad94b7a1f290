//! Report entrypoint: run all extensions and merge their output.

use std::time::Instant;

use super::{merge, Element, ExtensionContext, ExtensionRegistry, ParallelExecutor, ReportResult};

/// Run every extension in `registry` with a default-sized worker pool and
/// return the merged element sequence.
///
/// Extension failures appear as error elements in the result; only
/// infrastructure failures are returned as `Err`.
pub fn generate_aggregate_report(
    registry: &ExtensionRegistry,
    ctx: &ExtensionContext,
) -> ReportResult<Vec<Element>> {
    let executor = ParallelExecutor::new().max_workers(ctx.config().report.max_workers);
    generate_aggregate_report_with(&executor, registry, ctx)
}

/// Same as [`generate_aggregate_report`] with an explicit executor.
pub fn generate_aggregate_report_with(
    executor: &ParallelExecutor,
    registry: &ExtensionRegistry,
    ctx: &ExtensionContext,
) -> ReportResult<Vec<Element>> {
    let start = Instant::now();
    let reports = executor.run_all(registry, ctx)?;
    let elements = merge(&reports);

    tracing::debug!(
        elements = elements.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Aggregate report generated"
    );

    Ok(elements)
}
