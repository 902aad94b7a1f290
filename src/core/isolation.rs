//! Where extensions run.
//!
//! [`Isolation::Thread`] runs extensions on the worker threads themselves.
//! Panics are caught there, but a stack overflow, `abort` or `exit` inside an
//! extension takes the whole process down with it.
//!
//! [`Isolation::Process`] gives every extension its own child process. The
//! worker starts the configured program with the extension identifier as the
//! last argument and reads the extension's elements back as a JSON array on
//! its stdout. A child that dies or prints garbage only costs its own
//! extension, which gets an error element like any other failure.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use super::{Element, ExtensionId, Report};

/// Execution mode of a report run.
#[derive(Debug, Clone, Default)]
pub enum Isolation {
    /// Run on the pool threads.
    #[default]
    Thread,

    /// Run each extension in a child process.
    Process(ProcessRunner),
}

/// Isolation setting as it appears in the config file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IsolationMode {
    Thread,
    #[default]
    Process,
}

/// Command used to run a single extension out of process.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    program: PathBuf,
    args: Vec<OsString>,
}

impl ProcessRunner {
    /// Runner for `program`.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into(), args: Vec::new() }
    }

    /// Add an argument placed before the extension identifier.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Run one extension in a child process and collect its report.
    pub fn run(&self, id: &ExtensionId) -> Report {
        let start = Instant::now();
        let mut report = Report::new();

        match self.collect(id) {
            Ok(elements) => {
                tracing::debug!(
                    extension = %id,
                    elements = elements.len(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Extension process completed"
                );
                for element in elements {
                    report.add(element);
                }
            }
            Err(message) => {
                tracing::warn!(extension = %id, error = %message, "Extension process failed");
                report.add(Element::error(message));
            }
        }

        report
    }

    fn collect(&self, id: &ExtensionId) -> Result<Vec<Element>, String> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(id.as_str())
            .stdin(Stdio::null())
            .output()
            .map_err(|e| format!("failed to start extension process: {e}"))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let mut message = format!("extension process failed ({})", output.status);
            if let Some(last) = stderr.lines().rev().find(|l| !l.trim().is_empty()) {
                message.push_str(": ");
                message.push_str(last.trim());
            }
            return Err(message);
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| format!("invalid output from extension process: {e}"))
    }
}
