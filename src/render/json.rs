//! JSON rendering.

use serde::Serialize;

use crate::core::Element;

/// Serialized shape of a rendered report.
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    /// Report title
    pub title: &'a str,
    /// Generation time (RFC 3339, local time)
    pub generated_at: String,
    /// Merged elements
    pub elements: &'a [Element],
}

/// Render the report as pretty-printed JSON.
pub fn render_json(title: &str, elements: &[Element]) -> serde_json::Result<String> {
    let report =
        JsonReport { title, generated_at: chrono::Local::now().to_rfc3339(), elements };
    serde_json::to_string_pretty(&report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_json_shape() {
        let json = render_json("Weekly", &[Element::heading("Jira", 0), Element::error("down")])
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["title"], "Weekly");
        assert!(value["generated_at"].is_string());
        assert_eq!(value["elements"][0]["type"], "heading");
        assert_eq!(value["elements"][0]["level"], 0);
        assert_eq!(value["elements"][1]["type"], "error");
        assert_eq!(value["elements"][1]["message"], "down");
    }
}
