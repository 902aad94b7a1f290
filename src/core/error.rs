//! Errors raised by the aggregation engine itself.
//!
//! Failures of individual extensions never show up here; they become
//! error elements in the extension's own output.

use thiserror::Error;

use super::ExtensionId;

/// Errors that abort a whole report run.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Two extensions claimed the same identifier.
    #[error("Extension '{0}' is already registered")]
    DuplicateExtension(ExtensionId),

    /// A worker thread could not be started.
    #[error("Failed to start report worker: {0}")]
    WorkerPool(#[source] std::io::Error),

    /// An extension could not be queued for a worker.
    #[error("Failed to dispatch extension '{0}'")]
    Dispatch(ExtensionId),

    /// A worker died outside the extension boundary.
    #[error("Report worker panicked")]
    WorkerPanicked,

    /// An extension was dispatched but no result came back.
    #[error("No result received for extension '{0}'")]
    MissingResult(ExtensionId),
}

/// Result type for engine operations.
pub type ReportResult<T> = Result<T, ReportError>;
