//! HTML to plain text.

use scraper::Html;

/// Elements whose text is never page content.
const SKIPPED_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Extract the visible text of an HTML document: every text node, trimmed,
/// blank ones dropped, one per line.
pub fn html_to_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    let mut lines: Vec<&str> = Vec::new();

    for node in doc.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let skipped = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|el| SKIPPED_ELEMENTS.contains(&el.name()))
        });
        if skipped {
            continue;
        }
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            lines.push(trimmed);
        }
    }

    lines.join("\n")
}
