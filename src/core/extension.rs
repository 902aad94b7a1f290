//! The extension contract.
//!
//! An extension is an independently authored unit that contributes report
//! content. It receives its dependencies explicitly through an
//! [`ExtensionContext`] and writes only into the [`Report`] it is handed.

use std::fmt;
use std::sync::Arc;

use super::{Config, Report, RetryPolicy};

/// Stable identifier of a registered extension.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExtensionId(String);

impl ExtensionId {
    /// Create an identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExtensionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ExtensionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Trait implemented by every report-contributing extension.
///
/// Extensions run concurrently on separate workers in no particular order.
/// They must not rely on state shared with other extensions; anything they
/// need (such as an API client) is built from the context.
pub trait Extension: Send + Sync {
    /// Stable name, used as the registry identifier.
    fn name(&self) -> &str;

    /// Short human-readable description.
    fn description(&self) -> &str {
        ""
    }

    /// Append this extension's content to `report`.
    fn run(&self, ctx: &ExtensionContext, report: &mut Report) -> anyhow::Result<()>;
}

/// Dependencies passed explicitly to each extension run.
#[derive(Debug, Clone, Default)]
pub struct ExtensionContext {
    config: Arc<Config>,
    retry_policy: RetryPolicy,
}

impl ExtensionContext {
    /// Create a context from a configuration snapshot.
    pub fn new(config: Config) -> Self {
        let retry_policy = config.retry.policy();
        Self { config: Arc::new(config), retry_policy }
    }

    /// Override the retry policy handed to extensions.
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Read-only configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Policy for wrapping remote calls.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry_policy
    }
}

/// An extension backed by a closure.
pub struct FnExtension<F> {
    name: String,
    description: String,
    run: F,
}

impl<F> FnExtension<F>
where
    F: Fn(&ExtensionContext, &mut Report) -> anyhow::Result<()> + Send + Sync,
{
    /// Create a closure-backed extension.
    pub fn new(name: impl Into<String>, run: F) -> Self {
        Self { name: name.into(), description: String::new(), run }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

impl<F> Extension for FnExtension<F>
where
    F: Fn(&ExtensionContext, &mut Report) -> anyhow::Result<()> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn run(&self, ctx: &ExtensionContext, report: &mut Report) -> anyhow::Result<()> {
        (self.run)(ctx, report)
    }
}

impl<F> fmt::Debug for FnExtension<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnExtension").field("name", &self.name).finish()
    }
}
