//! Scraped corpus persistence (`output_data.json`).

use std::path::Path;

use siteqa_shared::{Result, ScrapedDocument, SiteQaError};
use tracing::{info, warn};

use crate::decode_text;

/// Load the corpus: a JSON array of page records.
pub fn load_corpus(path: &Path) -> Result<Vec<ScrapedDocument>> {
    let bytes = std::fs::read(path).map_err(|e| SiteQaError::io(path, e))?;
    let documents = parse_corpus(&decode_text(&bytes))
        .map_err(|e| SiteQaError::parse(format!("failed to parse {}: {e}", path.display())))?;

    info!(path = %path.display(), documents = documents.len(), "corpus loaded");
    Ok(documents)
}

/// Parse corpus JSON text. `null` array elements are skipped.
pub fn parse_corpus(json: &str) -> std::result::Result<Vec<ScrapedDocument>, serde_json::Error> {
    let records: Vec<Option<ScrapedDocument>> = serde_json::from_str(json)?;
    let total = records.len();
    let documents: Vec<ScrapedDocument> = records.into_iter().flatten().collect();

    let skipped = total - documents.len();
    if skipped > 0 {
        warn!(skipped, "null corpus records skipped");
    }
    Ok(documents)
}

/// Write the corpus as pretty-printed JSON, keeping Thai text unescaped.
pub fn save_corpus(path: &Path, documents: &[ScrapedDocument]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| SiteQaError::io(parent, e))?;
    }

    let json = serde_json::to_string_pretty(documents)
        .map_err(|e| SiteQaError::parse(format!("failed to serialize corpus: {e}")))?;
    std::fs::write(path, json).map_err(|e| SiteQaError::io(path, e))?;

    info!(path = %path.display(), documents = documents.len(), "corpus saved");
    Ok(())
}
