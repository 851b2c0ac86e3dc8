//! Corpus scraper: fetches every page in the link table and stores its text.
//!
//! This crate provides:
//! - [`extract`] — HTML to plain text
//! - [`engine`] — concurrent fetcher with per-URL retry, and corpus export

pub mod engine;
pub mod extract;

pub use engine::{ScrapeProgress, ScrapeReport, Scraper, SilentScrapeProgress};
pub use extract::html_to_text;
