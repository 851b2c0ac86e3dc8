//! Shared types, error model, and configuration for SiteQA.
//!
//! This crate is the foundation depended on by all other SiteQA crates.
//! It provides:
//! - [`SiteQaError`] — the unified error type
//! - Domain types ([`ScrapedDocument`], [`CatalogRow`], [`LinkRecord`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DataConfig, GenerationConfig, RetrievalConfig, ScrapeConfig, config_dir,
    config_file_path, init_config, init_config_at, load_config, load_config_from,
};
pub use error::{Result, SiteQaError};
pub use types::{CatalogRow, FETCH_FAILED_SENTINEL, LinkRecord, ScrapedDocument};
