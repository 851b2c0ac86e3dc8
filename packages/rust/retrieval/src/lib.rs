//! Lexical retrieval over the scraped corpus and the product catalog.
//!
//! This crate provides:
//! - [`tokenize`] — lower-casing, dictionary-based word segmentation (Thai aware)
//! - [`TfIdfSpace`] — smoothed TF-IDF vectors with L2 normalization
//! - [`DocumentIndex`] — best-context selection over scraped pages
//! - [`Catalog`] — identifier short-circuit + ranked product matching

pub mod catalog;
pub mod context;
pub mod tfidf;
pub mod tokenize;

pub use catalog::{
    ALL_CENTERS, Catalog, CatalogMatches, DEFAULT_MAX_ROWS, MatchStrategy, extract_identifiers,
};
pub use context::{ContextMatch, DocumentIndex, retrieval_key};
pub use tfidf::{QueryVector, TfIdfSpace};
pub use tokenize::tokenize;
