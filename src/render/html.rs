//! HTML rendering.

use std::fmt::Write;

use html_escape::{encode_single_quoted_attribute, encode_text};

use crate::core::{Element, ListItem, Tone};

/// Render a complete HTML document.
pub fn render_document(title: &str, elements: &[Element]) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset='utf-8'>\n");
    let _ = writeln!(out, "<title>{}</title>", encode_text(title));
    out.push_str("</head>\n<body>\n");
    let _ = writeln!(out, "<h1>{}</h1>", encode_text(title));

    for element in elements {
        out.push_str(&render_element(element));
        out.push('\n');
    }

    out.push_str("</body>\n</html>\n");
    out
}

/// Render a single element as an HTML fragment.
pub fn render_element(element: &Element) -> String {
    match element {
        Element::Text { text } => encode_text(text).into_owned(),
        Element::Heading { text, level } => {
            // <h1> is reserved for the document title
            let tag = (level.saturating_add(2)).min(6);
            format!("<h{tag}>{}</h{tag}>", encode_text(text))
        }
        Element::Paragraph { text } => format!("<p>{}</p>", encode_text(text)),
        Element::List { items } => {
            let mut out = String::from("<ul>\n");
            for item in items {
                let _ = writeln!(out, "<li>{}</li>", render_item(item));
            }
            out.push_str("</ul>");
            out
        }
        Element::Table { headers, rows } => render_table(headers, rows),
        Element::Rating { label, value, tone } => {
            format!("<p>{}: {}</p>", encode_text(label), highlight(*tone, value))
        }
        Element::Preformatted { text } => format!("<pre>{}</pre>", encode_text(text)),
        Element::Html { html } => html.clone(),
        Element::Error { .. } => {
            format!("<div class='error'>{}</div>", highlight(Tone::Bad, &element.to_string()))
        }
    }
}

fn render_item(item: &ListItem) -> String {
    match &item.link {
        Some(link) => format!(
            "[<a href='{}'>{}</a>] {}",
            encode_single_quoted_attribute(&link.href),
            encode_text(&link.label),
            encode_text(&item.text)
        ),
        None => encode_text(&item.text).into_owned(),
    }
}

fn highlight(tone: Tone, text: &str) -> String {
    format!("<span style=\"background-color: {}\">{}</span>", tone.color(), encode_text(text))
}

fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut out = String::from("<table>\n<thead>\n<tr>");
    for header in headers {
        let _ = write!(out, "<th>{}</th>", encode_text(header));
    }
    out.push_str("</tr>\n</thead>\n<tbody>\n");
    for row in rows {
        out.push_str("<tr>");
        for cell in row {
            let _ = write!(out, "<td>{}</td>", encode_text(cell));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody>\n</table>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_skeleton() {
        let doc = render_document("Weekly", &[Element::paragraph("hi")]);
        assert!(doc.starts_with("<!DOCTYPE html>"));
        assert!(doc.contains("<meta charset='utf-8'>"));
        assert!(doc.contains("<h1>Weekly</h1>"));
        assert!(doc.contains("<p>hi</p>"));
        assert!(doc.trim_end().ends_with("</html>"));
    }

    #[test]
    fn test_text_is_escaped() {
        assert_eq!(render_element(&Element::paragraph("a < b & c")), "<p>a &lt; b &amp; c</p>");
    }

    #[test]
    fn test_raw_html_passthrough() {
        let element = Element::Html { html: "<b>bold</b>".to_string() };
        assert_eq!(render_element(&element), "<b>bold</b>");
    }

    #[test]
    fn test_heading_levels() {
        assert_eq!(render_element(&Element::heading("Top", 0)), "<h2>Top</h2>");
        assert_eq!(render_element(&Element::heading("Sub", 1)), "<h3>Sub</h3>");
        assert_eq!(render_element(&Element::heading("Deep", 9)), "<h6>Deep</h6>");
    }

    #[test]
    fn test_list_and_table() {
        assert_eq!(render_element(&Element::list(["a", "b"])), "<ul>\n<li>a</li>\n<li>b</li>\n</ul>");

        let table = Element::Table {
            headers: vec!["Name".into()],
            rows: vec![vec!["x".into()], vec!["y".into()]],
        };
        let html = render_element(&table);
        assert!(html.contains("<th>Name</th>"));
        assert!(html.contains("<td>x</td>"));
        assert!(html.contains("<td>y</td>"));
    }

    #[test]
    fn test_linked_item() {
        let item = ListItem::linked("GTD-1", "https://x.test/browse/GTD-1", "Fix <this>");
        assert_eq!(
            render_element(&Element::list([item])),
            "<ul>\n<li>[<a href='https://x.test/browse/GTD-1'>GTD-1</a>] Fix &lt;this&gt;</li>\n</ul>"
        );

        let hostile = ListItem::linked("K", "x' onclick='y", "t");
        assert!(!render_element(&Element::list([hostile])).contains("x' onclick"));
    }

    #[test]
    fn test_rating_and_error_highlight() {
        let rating = render_element(&Element::rating("Overall rating", "Bad", Tone::Bad));
        assert_eq!(
            rating,
            "<p>Overall rating: <span style=\"background-color: red\">Bad</span></p>"
        );

        let error = render_element(&Element::error("boom"));
        assert!(error.contains("ERROR: boom"));
        assert!(error.contains("class='error'"));
    }
}
