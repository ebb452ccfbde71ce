//! Content extraction functionality for the crawler module

use std::collections::HashSet;

use scraper::{ElementRef, Html, Node, Selector};
use tracing::warn;

/// Title used for pages without a `<title>`
pub const UNTITLED: &str = "untitled";

/// Elements whose text is never visible
const HIDDEN_ELEMENTS: [&str; 5] = ["script", "style", "noscript", "template", "head"];

fn selector(source: &str) -> Option<Selector> {
    match Selector::parse(source) {
        Ok(selector) => Some(selector),
        Err(e) => {
            warn!("Failed to parse selector '{}': {}", source, e);
            None
        }
    }
}

/// De-duplicated raw `href` values of a page, in document order
pub fn extract_links(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let Some(selector) = selector("[href]") else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty() && seen.insert(href.to_string()))
        .map(str::to_string)
        .collect()
}

/// Visible text of a page with markup stripped.
///
/// Text nodes are joined by single spaces; content of script, style and
/// similar elements is dropped.
pub fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);

    let root = selector("body")
        .and_then(|body| document.select(&body).next())
        .unwrap_or_else(|| document.root_element());

    let mut parts = Vec::new();
    collect_text(root, &mut parts);
    parts.join(" ")
}

fn collect_text(element: ElementRef<'_>, parts: &mut Vec<String>) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
                if !text.is_empty() {
                    parts.push(text);
                }
            }
            Node::Element(el) if HIDDEN_ELEMENTS.contains(&el.name()) => {}
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    collect_text(child, parts);
                }
            }
            _ => {}
        }
    }
}

/// Text of the `<title>` element, or [`UNTITLED`]
pub fn extract_title(html: &str) -> String {
    let document = Html::parse_document(html);

    selector("title")
        .and_then(|title| document.select(&title).next())
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| UNTITLED.to_string())
}
