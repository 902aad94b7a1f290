//! Report accumulator and the elements extensions append to it.
//!
//! Every extension run gets its own [`Report`]. The elements it collects are
//! opaque to the engine apart from their plain-text form, which the merge
//! stage uses as an ordering key.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Emphasis applied to a highlighted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    /// Informational (blue)
    Info,
    /// Healthy (green)
    Good,
    /// Needs attention (yellow)
    Warning,
    /// Unhealthy (red)
    Bad,
}

impl Tone {
    /// Background color used when rendering to HTML.
    pub fn color(self) -> &'static str {
        match self {
            Self::Info => "aqua",
            Self::Good => "lime",
            Self::Warning => "yellow",
            Self::Bad => "red",
        }
    }
}

/// Hyperlink attached to a list item, e.g. a ticket key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub label: String,
    pub href: String,
}

/// Entry of a bulleted list.
///
/// A linked item displays as `[label] text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<Link>,
}

impl ListItem {
    /// Plain item.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), link: None }
    }

    /// Item prefixed by a link.
    pub fn linked(
        label: impl Into<String>,
        href: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self { text: text.into(), link: Some(Link { label: label.into(), href: href.into() }) }
    }
}

impl fmt::Display for ListItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.link {
            Some(link) => write!(f, "[{}] {}", link.label, self.text),
            None => f.write_str(&self.text),
        }
    }
}

impl From<&str> for ListItem {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for ListItem {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

/// A single renderable unit of report output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Element {
    /// Bare text.
    Text { text: String },

    /// Section heading. Level 0 is the top-level section.
    Heading { text: String, level: u8 },

    /// Paragraph of text.
    Paragraph { text: String },

    /// Bulleted list.
    List { items: Vec<ListItem> },

    /// Table with a header row.
    Table { headers: Vec<String>, rows: Vec<Vec<String>> },

    /// A labelled value with a highlight, e.g. "Overall rating: Bad".
    Rating { label: String, value: String, tone: Tone },

    /// Text whose whitespace must be preserved (command output).
    Preformatted { text: String },

    /// Pre-rendered HTML fragment, emitted verbatim by the HTML renderer.
    Html { html: String },

    /// Failure of the extension that produced this element.
    Error { message: String },
}

impl Element {
    /// Bare text element.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Heading element.
    pub fn heading(text: impl Into<String>, level: u8) -> Self {
        Self::Heading { text: text.into(), level }
    }

    /// Paragraph element.
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::Paragraph { text: text.into() }
    }

    /// List element.
    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ListItem>,
    {
        Self::List { items: items.into_iter().map(Into::into).collect() }
    }

    /// Table element.
    pub fn table(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self::Table { headers, rows }
    }

    /// Rating element.
    pub fn rating(label: impl Into<String>, value: impl Into<String>, tone: Tone) -> Self {
        Self::Rating { label: label.into(), value: value.into(), tone }
    }

    /// Error element.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error { message: message.into() }
    }

    /// Check if this element marks a failure.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text { text }
            | Self::Heading { text, .. }
            | Self::Paragraph { text }
            | Self::Preformatted { text } => f.write_str(text),
            Self::List { items } => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str("\n")?;
                    }
                    write!(f, "- {item}")?;
                }
                Ok(())
            }
            Self::Table { headers, rows } => {
                f.write_str(&headers.join("\t"))?;
                for row in rows {
                    write!(f, "\n{}", row.join("\t"))?;
                }
                Ok(())
            }
            Self::Rating { label, value, .. } => write!(f, "{label}: {value}"),
            Self::Html { html } => f.write_str(html),
            Self::Error { message } => write!(f, "ERROR: {message}"),
        }
    }
}

impl From<&str> for Element {
    fn from(text: &str) -> Self {
        Self::text(text)
    }
}

impl From<String> for Element {
    fn from(text: String) -> Self {
        Self::Text { text }
    }
}

/// Ordered, append-only sequence of elements written by one extension run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    elements: Vec<Element>,
}

impl Report {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an element.
    pub fn add(&mut self, element: impl Into<Element>) {
        self.elements.push(element.into());
    }

    /// Append a heading.
    pub fn heading(&mut self, text: impl Into<String>, level: u8) {
        self.add(Element::heading(text, level));
    }

    /// Append a paragraph.
    pub fn paragraph(&mut self, text: impl Into<String>) {
        self.add(Element::paragraph(text));
    }

    /// Append a bulleted list.
    pub fn items<I, S>(&mut self, items: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<ListItem>,
    {
        self.add(Element::list(items));
    }

    /// All elements in insertion order.
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Consume the report, returning its elements.
    pub fn into_elements(self) -> Vec<Element> {
        self.elements
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Check if nothing has been added.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Check if any element marks a failure.
    pub fn has_error(&self) -> bool {
        self.elements.iter().any(Element::is_error)
    }
}
