//! Extension registry.
//!
//! Holds the set of extensions available to a report run, keyed by their
//! stable identifier. The registry is populated once at startup, either by
//! explicit [`ExtensionRegistry::register`] calls or from a manifest of
//! factories, and is read-only while a report is generated.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::{Config, Extension, ExtensionId, ReportError, ReportResult};

/// Builds an extension from the configuration.
///
/// Returning `Ok(None)` means the extension opted out (for example because
/// it is not configured).
pub type ExtensionFactory = fn(&Config) -> anyhow::Result<Option<Box<dyn Extension>>>;

/// One entry of an extension manifest.
#[derive(Debug, Clone, Copy)]
pub struct ManifestEntry {
    /// Name the factory registers under.
    pub name: &'static str,

    /// Factory building the extension.
    pub factory: ExtensionFactory,
}

impl ManifestEntry {
    /// Create a manifest entry.
    pub const fn new(name: &'static str, factory: ExtensionFactory) -> Self {
        Self { name, factory }
    }
}

/// Registry of report extensions.
#[derive(Default, Clone)]
pub struct ExtensionRegistry {
    extensions: BTreeMap<ExtensionId, Arc<dyn Extension>>,
}

impl std::fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionRegistry")
            .field("extensions", &self.extensions.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ExtensionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a manifest.
    ///
    /// Entries whose factory fails or whose name is already taken are
    /// logged and skipped; the remaining entries are still registered.
    pub fn discover(manifest: &[ManifestEntry], config: &Config) -> Self {
        let mut registry = Self::new();

        for entry in manifest {
            if config.report.disabled.iter().any(|d| d == entry.name) {
                tracing::debug!(extension = entry.name, "Extension disabled by config");
                continue;
            }

            match (entry.factory)(config) {
                Ok(Some(extension)) => {
                    if let Err(e) = registry.register_boxed(extension) {
                        tracing::warn!(extension = entry.name, error = %e, "Skipping extension");
                    }
                }
                Ok(None) => {
                    tracing::debug!(extension = entry.name, "Extension not configured");
                }
                Err(e) => {
                    tracing::warn!(
                        extension = entry.name,
                        error = %e,
                        "Failed to load extension, skipping"
                    );
                }
            }
        }

        tracing::debug!(count = registry.len(), "Discovered extensions");
        registry
    }

    /// Register an extension.
    pub fn register(&mut self, extension: impl Extension + 'static) -> ReportResult<()> {
        self.insert(Arc::new(extension))
    }

    /// Register a boxed extension.
    pub fn register_boxed(&mut self, extension: Box<dyn Extension>) -> ReportResult<()> {
        self.insert(Arc::from(extension))
    }

    fn insert(&mut self, extension: Arc<dyn Extension>) -> ReportResult<()> {
        let id = ExtensionId::new(extension.name());
        if self.extensions.contains_key(&id) {
            return Err(ReportError::DuplicateExtension(id));
        }
        self.extensions.insert(id, extension);
        Ok(())
    }

    /// Get an extension by identifier.
    pub fn get(&self, id: &ExtensionId) -> Option<&Arc<dyn Extension>> {
        self.extensions.get(id)
    }

    /// Identifiers of all registered extensions, in identifier order.
    pub fn ids(&self) -> impl Iterator<Item = &ExtensionId> {
        self.extensions.keys()
    }

    /// All registered extensions, in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&ExtensionId, &Arc<dyn Extension>)> {
        self.extensions.iter()
    }

    /// Number of registered extensions.
    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ExtensionContext, FnExtension, Report};

    fn noop(name: &str) -> impl Extension {
        FnExtension::new(name, |_: &ExtensionContext, _: &mut Report| Ok(()))
    }

    fn make_alpha(_: &Config) -> anyhow::Result<Option<Box<dyn Extension>>> {
        Ok(Some(Box::new(noop("alpha"))))
    }

    fn make_beta(_: &Config) -> anyhow::Result<Option<Box<dyn Extension>>> {
        Ok(Some(Box::new(noop("beta"))))
    }

    fn make_broken(_: &Config) -> anyhow::Result<Option<Box<dyn Extension>>> {
        anyhow::bail!("missing credentials")
    }

    fn make_unconfigured(_: &Config) -> anyhow::Result<Option<Box<dyn Extension>>> {
        Ok(None)
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = ExtensionRegistry::new();
        registry.register(noop("jira")).unwrap();
        registry.register(noop("trello")).unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.get(&ExtensionId::from("jira")).is_some());
        assert!(registry.get(&ExtensionId::from("notes")).is_none());
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut registry = ExtensionRegistry::new();
        registry.register(noop("jira")).unwrap();

        let err = registry.register(noop("jira")).unwrap_err();
        assert!(matches!(err, ReportError::DuplicateExtension(ref id) if id.as_str() == "jira"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_ids_are_sorted() {
        let mut registry = ExtensionRegistry::new();
        registry.register(noop("c")).unwrap();
        registry.register(noop("a")).unwrap();
        registry.register(noop("b")).unwrap();

        let ids: Vec<&str> = registry.ids().map(ExtensionId::as_str).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_discover_skips_failures_and_duplicates() {
        let manifest = [
            ManifestEntry::new("broken", make_broken),
            ManifestEntry::new("alpha", make_alpha),
            ManifestEntry::new("unconfigured", make_unconfigured),
            ManifestEntry::new("alpha-again", make_alpha),
            ManifestEntry::new("beta", make_beta),
        ];

        let registry = ExtensionRegistry::discover(&manifest, &Config::default());
        let ids: Vec<&str> = registry.ids().map(ExtensionId::as_str).collect();
        assert_eq!(ids, vec!["alpha", "beta"]);
    }

    #[test]
    fn test_discover_honours_disabled() {
        let manifest =
            [ManifestEntry::new("alpha", make_alpha), ManifestEntry::new("beta", make_beta)];
        let mut config = Config::default();
        config.report.disabled = vec!["beta".to_string()];

        let registry = ExtensionRegistry::discover(&manifest, &config);
        assert_eq!(registry.len(), 1);
        assert!(registry.get(&ExtensionId::from("alpha")).is_some());
    }
}
