//! Notes extension.
//!
//! Picks the section of the notes tree to revise this week. Every
//! `README.md` below the notes root contributes its level-1 headings; the
//! ISO week selects one of them.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{Datelike, Local};
use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};
use walkdir::WalkDir;

use crate::core::{Config, Extension, ExtensionContext, Report};

/// Registry name.
pub const NAME: &str = "notes";

const README: &str = "README.md";

/// Level-1 headings of a Markdown document, ATX and setext alike.
pub fn level1_headings(markdown: &str) -> Vec<String> {
    let mut headings = Vec::new();
    let mut current: Option<String> = None;

    for event in Parser::new(markdown) {
        match event {
            Event::Start(Tag::Heading { level: HeadingLevel::H1, .. }) => {
                current = Some(String::new());
            }
            Event::End(TagEnd::Heading(HeadingLevel::H1)) => {
                if let Some(text) = current.take() {
                    let text = text.trim();
                    if !text.is_empty() {
                        headings.push(text.to_string());
                    }
                }
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some(buf) = current.as_mut() {
                    buf.push_str(&text);
                }
            }
            Event::SoftBreak | Event::HardBreak => {
                if let Some(buf) = current.as_mut() {
                    buf.push(' ');
                }
            }
            _ => {}
        }
    }

    headings
}

/// Collect `"<dir> - <heading>"` entries from every `README.md` below `root`.
///
/// The README at the root itself is ignored. Directories are visited in
/// name order so the result is stable across runs.
pub fn collect_sections(root: &Path) -> anyhow::Result<Vec<String>> {
    let mut sections = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
        if !entry.file_type().is_file() || entry.file_name() != README {
            continue;
        }

        let Some(dir) = entry.path().parent() else { continue };
        let Ok(relative) = dir.strip_prefix(root) else { continue };
        if relative.as_os_str().is_empty() {
            continue;
        }

        let content = std::fs::read_to_string(entry.path())
            .with_context(|| format!("Failed to read {}", entry.path().display()))?;
        let basedir = relative.to_string_lossy().replace('\\', "/");
        sections.extend(
            level1_headings(&content).into_iter().map(|h| format!("{basedir} - {h}")),
        );
    }

    Ok(sections)
}

/// Index of the section for an ISO week.
pub fn week_index(year: i32, week: u32, count: usize) -> usize {
    let n = i64::from(year) * 100 + i64::from(week);
    n.rem_euclid(count.max(1) as i64) as usize
}

/// Weekly notes exercise extension.
#[derive(Debug)]
pub struct NotesExtension {
    root: PathBuf,
}

impl NotesExtension {
    /// Create the extension for a notes tree.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

/// Build the extension when a notes path is configured.
pub fn factory(config: &Config) -> anyhow::Result<Option<Box<dyn Extension>>> {
    let path = config.notes.path.trim();
    if path.is_empty() {
        return Ok(None);
    }
    let expanded = shellexpand::full(path)
        .with_context(|| format!("Failed to expand notes path '{path}'"))?;
    Ok(Some(Box::new(NotesExtension::new(expanded.into_owned()))))
}

impl Extension for NotesExtension {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Weekly exercise section picked from the notes tree"
    }

    fn run(&self, _ctx: &ExtensionContext, report: &mut Report) -> anyhow::Result<()> {
        let sections = collect_sections(&self.root)?;
        if sections.is_empty() {
            anyhow::bail!("No README.md headings found under {}", self.root.display());
        }

        let week = Local::now().date_naive().iso_week();
        let index = week_index(week.year(), week.week(), sections.len());
        tracing::debug!(count = sections.len(), index, "Picked exercise section");

        report.heading("Exercise section", 0);
        report.paragraph(format!("This week we will work on {}", sections[index]));
        Ok(())
    }
}
