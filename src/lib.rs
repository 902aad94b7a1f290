#![allow(clippy::format_push_string)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]

//! # gtd
//!
//! Aggregated task reports built from independently authored extensions.
//!
//! Each extension contributes a section (Jira backlog health, Trello cards,
//! the weekly notes exercise, output of user scripts). Extensions run
//! concurrently and in isolation; their output is merged into one
//! deterministic sequence and rendered as HTML, JSON or text.
//!
//! ## Quick Start
//!
//! ```bash
//! # Render the report to a file
//! gtd report --output report.html
//!
//! # See which extensions the current config enables
//! gtd extensions
//! ```
//!
//! ## Library use
//!
//! ```
//! use gtd::core::{
//!     generate_aggregate_report, ExtensionContext, ExtensionRegistry, FnExtension, Report,
//! };
//!
//! let mut registry = ExtensionRegistry::new();
//! registry
//!     .register(FnExtension::new("hello", |_: &ExtensionContext, report: &mut Report| {
//!         report.heading("Hello", 0);
//!         Ok(())
//!     }))
//!     .unwrap();
//!
//! let elements = generate_aggregate_report(&registry, &ExtensionContext::default()).unwrap();
//! assert_eq!(elements[0].to_string(), "Hello");
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
// Allow common patterns that are intentional in this codebase
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::manual_let_else)]
#![allow(clippy::derivable_impls)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::significant_drop_tightening)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::unnecessary_wraps)]

pub mod core;
pub mod extensions;
pub mod render;

#[cfg(feature = "integrations")]
pub mod integrations;

// Re-export commonly used types
pub use core::{
    generate_aggregate_report, Config, Element, Extension, ExtensionContext, ExtensionId,
    ExtensionRegistry, Isolation, ListItem, Report, ReportError, RetryPolicy,
};
pub use extensions::discover_extensions;
pub use render::OutputFormat;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "gtd";
