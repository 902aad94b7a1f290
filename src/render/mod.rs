//! Presentation of the final element sequence.
//!
//! The engine never formats output itself; these renderers turn merged
//! elements into an HTML document, a JSON object, or plain text.

pub mod html;
pub mod json;
pub mod text;

use std::str::FromStr;

use crate::core::Element;

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Full HTML document
    #[default]
    Html,
    /// Pretty-printed JSON
    Json,
    /// Plain text
    Text,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "html" => Ok(Self::Html),
            "json" => Ok(Self::Json),
            "text" | "txt" => Ok(Self::Text),
            other => Err(format!("Unknown format '{other}' (expected html, json or text)")),
        }
    }
}

/// Render `elements` in the requested format.
pub fn render(format: OutputFormat, title: &str, elements: &[Element]) -> anyhow::Result<String> {
    Ok(match format {
        OutputFormat::Html => html::render_document(title, elements),
        OutputFormat::Json => json::render_json(title, elements)?,
        OutputFormat::Text => text::render_text(elements),
    })
}
