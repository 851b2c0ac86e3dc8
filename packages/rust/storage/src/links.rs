//! Link table CSV: the list of pages to scrape and their metadata.

use std::path::Path;

use siteqa_shared::{LinkRecord, Result, SiteQaError};
use tracing::info;

use crate::decode_text;

/// Columns the link table must carry, by exact name.
pub const REQUIRED_LINK_COLUMNS: [&str; 6] = ["ID", "URL", "Center", "Header", "NamePage", "Tag"];

/// Load the link table from disk.
pub fn load_link_table(path: &Path) -> Result<Vec<LinkRecord>> {
    let bytes = std::fs::read(path).map_err(|e| SiteQaError::io(path, e))?;
    let records = parse_link_table(&decode_text(&bytes))?;
    info!(path = %path.display(), links = records.len(), "link table loaded");
    Ok(records)
}

/// Parse link table CSV text. Fails if any required column is absent.
pub fn parse_link_table(text: &str) -> Result<Vec<LinkRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| SiteQaError::parse(format!("link table header: {e}")))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut positions = [0usize; REQUIRED_LINK_COLUMNS.len()];
    for (slot, name) in positions.iter_mut().zip(REQUIRED_LINK_COLUMNS) {
        *slot = headers.iter().position(|h| h == name).ok_or_else(|| {
            SiteQaError::validation(format!("column '{name}' not found in the link table"))
        })?;
    }
    let [id, url, center, header, name_page, tag] = positions;

    let mut records = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record
            .map_err(|e| SiteQaError::parse(format!("link table row {}: {e}", line + 1)))?;
        let cell = |i: usize| record.get(i).unwrap_or("").to_string();
        records.push(LinkRecord {
            id: cell(id),
            url: cell(url),
            center: cell(center),
            header: cell(header),
            name_page: cell(name_page),
            tag: cell(tag),
        });
    }
    Ok(records)
}
