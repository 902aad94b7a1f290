//! Deterministic merge of per-extension reports.
//!
//! Extensions finish in whatever order the scheduler allows, so their
//! reports are ordered by a key derived from their content instead:
//!
//! - a report whose first element is ordinary content is keyed by that
//!   element's plain text, then by extension id;
//! - a report whose first element is an error (the extension failed before
//!   writing anything) sorts directly after the nearest preceding non-empty
//!   report in id order, or first when there is none;
//! - empty reports contribute nothing.

use std::cmp::Ordering;

use super::{Element, ExtensionId, ExtensionReports, Report};

/// Ordering key of one report in the merged output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeKey {
    /// Plain text of the first content element.
    primary: String,
    /// Extension the position is anchored to.
    anchor: ExtensionId,
    /// Distance from the anchor (0 for the anchor itself).
    offset: usize,
}

impl MergeKey {
    fn content(first: &Element, id: &ExtensionId) -> Self {
        Self { primary: first.to_string(), anchor: id.clone(), offset: 0 }
    }

    fn leading(id: &ExtensionId) -> Self {
        Self { primary: String::new(), anchor: id.clone(), offset: 0 }
    }

    fn follower(&self) -> Self {
        Self { primary: self.primary.clone(), anchor: self.anchor.clone(), offset: self.offset + 1 }
    }
}

impl Ord for MergeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.primary
            .cmp(&other.primary)
            .then_with(|| self.anchor.cmp(&other.anchor))
            .then_with(|| self.offset.cmp(&other.offset))
    }
}

impl PartialOrd for MergeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Compute the merge key of every non-empty report.
pub fn merge_keys(reports: &ExtensionReports) -> Vec<(MergeKey, &ExtensionId, &Report)> {
    let mut keyed = Vec::with_capacity(reports.len());
    let mut previous: Option<MergeKey> = None;

    for (id, report) in reports {
        let Some(first) = report.elements().first() else {
            continue;
        };

        let key = if first.is_error() {
            match &previous {
                Some(prev) => prev.follower(),
                None => MergeKey::leading(id),
            }
        } else {
            MergeKey::content(first, id)
        };

        previous = Some(key.clone());
        keyed.push((key, id, report));
    }

    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    keyed
}

/// Merge per-extension reports into one ordered sequence.
pub fn merge(reports: &ExtensionReports) -> Vec<Element> {
    merge_keys(reports)
        .into_iter()
        .flat_map(|(_, _, report)| report.elements().iter().cloned())
        .collect()
}
