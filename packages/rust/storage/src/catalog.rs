//! Product/service catalog CSV.
//!
//! Column names vary between exports, so each logical field accepts several
//! header spellings (compared trimmed and lower-cased, first synonym present
//! wins). A logical field with no matching column becomes empty text.

use std::path::Path;

use siteqa_shared::{CatalogRow, Result, SiteQaError};
use tracing::{info, warn};

use crate::decode_text;

const ID_HEADERS: &[&str] = &["id"];
const NAME_HEADERS: &[&str] = &[
    "name",
    "product",
    "product name",
    "ชื่อสินค้า",
    "รายชื่อสินค้า",
    "รายการสินค้า",
];
const CENTER_HEADERS: &[&str] = &["center", "ศูนย์", "ศูนย์งาน", "หน่วยงาน"];
const LINK_HEADERS: &[&str] = &["link", "url", "ลิงก์", "ลิ้งค์"];

/// Header line used when exporting rows.
const EXPORT_HEADERS: [&str; 4] = ["ID", "ชื่อสินค้า", "ศูนย์", "link"];

/// Load the catalog. A missing file is an empty catalog, not an error.
pub fn load_catalog(path: &Path) -> Result<Vec<CatalogRow>> {
    if !path.exists() {
        warn!(path = %path.display(), "catalog file not found, continuing without products");
        return Ok(Vec::new());
    }

    let bytes = std::fs::read(path).map_err(|e| SiteQaError::io(path, e))?;
    let rows = parse_catalog(&decode_text(&bytes))
        .map_err(|e| SiteQaError::parse(format!("failed to parse {}: {e}", path.display())))?;

    info!(path = %path.display(), rows = rows.len(), "catalog loaded");
    Ok(rows)
}

/// Parse catalog CSV text into normalized rows.
pub fn parse_catalog(text: &str) -> std::result::Result<Vec<CatalogRow>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();
    let column = |synonyms: &[&str]| {
        synonyms
            .iter()
            .find_map(|s| headers.iter().position(|h| h == s))
    };
    let (id, name, center, link) = (
        column(ID_HEADERS),
        column(NAME_HEADERS),
        column(CENTER_HEADERS),
        column(LINK_HEADERS),
    );

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let cell = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i))
                .unwrap_or("")
                .trim()
                .to_string()
        };
        rows.push(CatalogRow {
            id: cell(id),
            name: cell(name),
            center: cell(center),
            link: cell(link),
        });
    }
    Ok(rows)
}

/// Write rows as CSV (UTF-8 with BOM so spreadsheet tools detect Thai).
/// Links that are not http(s) URLs are written blank.
pub fn export_catalog_csv<'a, I>(path: &Path, rows: I) -> Result<usize>
where
    I: IntoIterator<Item = &'a CatalogRow>,
{
    let mut writer = csv::Writer::from_writer(Vec::from(crate::UTF8_BOM));
    let csv_err = |e: csv::Error| SiteQaError::parse(format!("failed to write CSV: {e}"));

    writer.write_record(EXPORT_HEADERS).map_err(csv_err)?;
    let mut count = 0;
    for row in rows {
        writer
            .write_record([
                row.id.as_str(),
                row.name.as_str(),
                row.center.as_str(),
                row.web_link().unwrap_or(""),
            ])
            .map_err(csv_err)?;
        count += 1;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| SiteQaError::parse(format!("failed to flush CSV: {e}")))?;
    std::fs::write(path, bytes).map_err(|e| SiteQaError::io(path, e))?;

    info!(path = %path.display(), rows = count, "catalog rows exported");
    Ok(count)
}
