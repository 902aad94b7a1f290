//! Plain-text rendering.

use crate::core::Element;

/// Render each element's plain-text form on its own line.
pub fn render_text(elements: &[Element]) -> String {
    let mut out = String::new();
    for element in elements {
        out.push_str(&element.to_string());
        out.push('\n');
    }
    out
}
