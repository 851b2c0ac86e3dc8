//! File-backed storage for SiteQA inputs and outputs.
//!
//! - [`corpus`] — the scraped corpus JSON (read by the answerer, written by the scraper)
//! - [`catalog`] — the product/service catalog CSV, with header normalization
//! - [`links`] — the link table CSV the scraper consumes
//!
//! Text files are read as UTF-8 (a leading BOM is ignored). Bytes that are
//! not valid UTF-8 are decoded as Windows-874, the legacy Thai code page.

pub mod catalog;
pub mod corpus;
pub mod links;

pub use catalog::{export_catalog_csv, load_catalog, parse_catalog};
pub use corpus::{load_corpus, parse_corpus, save_corpus};
pub use links::{REQUIRED_LINK_COLUMNS, load_link_table, parse_link_table};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Decode file bytes: UTF-8 first, Windows-874 as the fallback.
pub(crate) fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            tracing::debug!("input is not UTF-8, decoding as windows-874");
            let (text, _) = encoding_rs::WINDOWS_874.decode_without_bom_handling(bytes);
            text.into_owned()
        }
    }
}
