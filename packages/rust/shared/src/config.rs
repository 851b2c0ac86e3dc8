//! Application configuration for SiteQA.
//!
//! User config lives at `~/.siteqa/siteqa.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SiteQaError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "siteqa.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".siteqa";

// ---------------------------------------------------------------------------
// Config structs (matching siteqa.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Input file locations.
    #[serde(default)]
    pub data: DataConfig,

    /// Ollama settings.
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Retrieval limits.
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Corpus scraping policy.
    #[serde(default)]
    pub scrape: ScrapeConfig,
}

impl AppConfig {
    /// Reject values that would make every request fail before it starts.
    pub fn validate(&self) -> Result<()> {
        if self.generation.timeout_secs == 0 {
            return Err(SiteQaError::config("generation.timeout_secs must be greater than 0"));
        }
        if self.scrape.timeout_secs == 0 {
            return Err(SiteQaError::config("scrape.timeout_secs must be greater than 0"));
        }
        Ok(())
    }
}

/// `[data]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Scraped corpus (JSON array).
    #[serde(default = "default_corpus_path")]
    pub corpus_path: String,

    /// Product/service catalog (CSV).
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            corpus_path: default_corpus_path(),
            catalog_path: default_catalog_path(),
        }
    }
}

fn default_corpus_path() -> String {
    "output_data.json".into()
}
fn default_catalog_path() -> String {
    "Product List.csv".into()
}

/// `[generation]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Ollama server base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model name passed to Ollama.
    #[serde(default = "default_model")]
    pub model: String,

    /// Upper bound on a single generation call, in seconds.
    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,
}

impl GenerationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            timeout_secs: default_generation_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:11434".into()
}
fn default_model() -> String {
    "gemma2".into()
}
fn default_generation_timeout() -> u64 {
    120
}

/// `[retrieval]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Characters of page text forwarded to the model.
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,

    /// Maximum catalog rows appended to an answer.
    #[serde(default = "default_max_catalog_rows")]
    pub max_catalog_rows: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_context_chars: default_max_context_chars(),
            max_catalog_rows: default_max_catalog_rows(),
        }
    }
}

fn default_max_context_chars() -> usize {
    10_000
}
fn default_max_catalog_rows() -> usize {
    5
}

/// `[scrape]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    /// Maximum concurrent page fetches.
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,

    /// Attempts per URL before giving up.
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Per-request timeout in seconds.
    #[serde(default = "default_scrape_timeout")]
    pub timeout_secs: u64,

    /// Pause between failed attempts, in seconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            retries: default_retries(),
            timeout_secs: default_scrape_timeout(),
            retry_delay_secs: default_retry_delay(),
        }
    }
}

fn default_concurrency() -> u32 {
    8
}
fn default_retries() -> u32 {
    3
}
fn default_scrape_timeout() -> u64 {
    30
}
fn default_retry_delay() -> u64 {
    5
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.siteqa/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| SiteQaError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.siteqa/siteqa.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| SiteQaError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content)
        .map_err(|e| SiteQaError::config(format!("failed to parse {}: {e}", path.display())))?;
    config.validate()?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let path = config_file_path()?;
    init_config_at(&path)?;
    Ok(path)
}

/// Write a default config file at `path`, creating parent directories.
pub fn init_config_at(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| SiteQaError::io(dir, e))?;
    }

    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| SiteQaError::config(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| SiteQaError::io(path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(())
}
