//! Built-in report extensions.
//!
//! Each extension lives in its own module and exposes a `NAME` and a
//! `factory`. The factories are listed in [`builtin`], which is the manifest
//! the report command discovers extensions from.

#[cfg(feature = "integrations")]
pub mod jira;
pub mod notes;
pub mod scripts;
#[cfg(feature = "integrations")]
pub mod trello;

use crate::core::{Config, ExtensionRegistry, ManifestEntry};

/// Manifest of the built-in extensions.
pub fn builtin() -> Vec<ManifestEntry> {
    let mut manifest = Vec::new();

    #[cfg(feature = "integrations")]
    {
        manifest.push(ManifestEntry::new(jira::NAME, jira::factory));
        manifest.push(ManifestEntry::new(trello::NAME, trello::factory));
    }

    manifest.push(ManifestEntry::new(notes::NAME, notes::factory));
    manifest.push(ManifestEntry::new(scripts::NAME, scripts::factory));
    manifest
}

/// Build the registry of built-in extensions enabled by `config`.
pub fn discover_extensions(config: &Config) -> ExtensionRegistry {
    ExtensionRegistry::discover(&builtin(), config)
}
