//! Fixed answer strings and the catalog Markdown table.

use siteqa_shared::CatalogRow;

/// Answer when no page shares vocabulary with the question.
pub const NOT_FOUND: &str = "❌ ไม่พบเนื้อหาที่เกี่ยวข้องในฐานข้อมูล";

/// Replaces the model reply when generation fails or times out.
pub const GENERATION_UNAVAILABLE: &str =
    "⚠️ ขออภัย ระบบไม่สามารถสร้างคำตอบได้ในขณะนี้ กรุณาลองใหม่อีกครั้ง";

pub const REFERENCE_PREFIX: &str = "🔗 อ้างอิง: ";
pub const MISSING_URL: &str = "ไม่พบ URL";

/// Catalog label after the not-found message.
pub const LABEL_POSSIBLY_RELATED: &str = "**สินค้า/บริการที่อาจเกี่ยวข้องกับคำถามคุณ:**";
/// Catalog label after a generated answer.
pub const LABEL_RELATED: &str = "**สินค้า/บริการที่เกี่ยวข้อง:**";

pub const SEPARATOR: &str = "---";

/// Link cell text for rows without a usable web link.
pub const NO_LINK: &str = "ไม่พบข้อมูล";

const TABLE_HEADER: &str = "| ID | ชื่อสินค้า | ศูนย์ | link |\n|---|---|---|---|";

/// `🔗 อ้างอิง: <url>`, or the missing-URL marker when blank.
pub fn reference_line(url: &str) -> String {
    let url = url.trim();
    let url = if url.is_empty() { MISSING_URL } else { url };
    format!("{REFERENCE_PREFIX}{url}")
}

/// `[link](<url>)` for http(s) links, the placeholder otherwise. Spaces left
/// after flattening are percent-encoded so the link target stays one token.
pub fn link_cell(row: &CatalogRow) -> String {
    match row.web_link() {
        Some(url) => format!("[link]({})", escape_cell(url).replace(' ', "%20")),
        None => NO_LINK.to_string(),
    }
}

/// Keep a value on one table row and inside its cell.
fn escape_cell(value: &str) -> String {
    value
        .replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
        .replace('|', "\\|")
}

/// Markdown table of catalog rows, `None` when there are none.
pub fn catalog_table(rows: &[CatalogRow]) -> Option<String> {
    if rows.is_empty() {
        return None;
    }

    let mut table = String::from(TABLE_HEADER);
    for row in rows {
        table.push_str(&format!(
            "\n| {} | {} | {} | {} |",
            escape_cell(&row.id),
            escape_cell(&row.name),
            escape_cell(&row.center),
            link_cell(row),
        ));
    }
    Some(table)
}

/// Join the answer head with an optional labelled catalog block.
pub fn with_catalog_block(head: String, label: &str, rows: &[CatalogRow]) -> String {
    match catalog_table(rows) {
        Some(table) => [head.as_str(), SEPARATOR, label, &table].join("\n\n"),
        None => head,
    }
}
