//! Core types and functionality for gtd.
//!
//! This module contains the extension aggregation engine: the report
//! accumulator, the extension registry, parallel execution, the
//! deterministic merge, and the retry wrapper used for remote calls.

mod aggregate;
mod config;
mod error;
mod extension;
mod isolation;
mod merge;
mod parallel;
mod registry;
mod report;
mod retry;

pub use aggregate::{generate_aggregate_report, generate_aggregate_report_with};
pub use config::{
    Config, JiraConfig, NotesConfig, ReportConfig, RetryConfig, ScriptConfig, TrelloConfig,
    CONFIG_ENV, REDACTED,
};
pub use error::{ReportError, ReportResult};
pub use extension::{Extension, ExtensionContext, ExtensionId, FnExtension};
pub use isolation::{Isolation, IsolationMode, ProcessRunner};
pub use merge::{merge, merge_keys, MergeKey};
pub use parallel::{run_extension, ExtensionReports, ParallelExecutor};
pub use registry::{ExtensionFactory, ExtensionRegistry, ManifestEntry};
pub use report::{Element, Link, ListItem, Report, Tone};
pub use retry::{retry, retry_with_sleep, with_retry, RetryPolicy, RetryResult};
