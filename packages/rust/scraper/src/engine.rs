//! Concurrent page fetcher for building the corpus.
//!
//! Every link is fetched in its own task, bounded by a semaphore. A URL gets
//! `retries` attempts with a fixed pause between them; pages that never come
//! back (or come back without text) are stored with the fetch-failed sentinel
//! so the corpus keeps one record per link, in link-table order.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::Client;
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use siteqa_shared::{
    FETCH_FAILED_SENTINEL, LinkRecord, Result, ScrapeConfig, ScrapedDocument, SiteQaError,
};

use crate::extract::html_to_text;

/// User-Agent string for scrape requests.
const USER_AGENT: &str = concat!("SiteQA/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// ScrapeReport
// ---------------------------------------------------------------------------

/// Summary of a completed scrape.
#[derive(Debug, Clone)]
pub struct ScrapeReport {
    /// Pages whose text was extracted.
    pub pages_fetched: usize,
    /// Pages stored with the fetch-failed sentinel.
    pub pages_failed: usize,
    /// Total duration of the scrape.
    pub duration: Duration,
}

/// Progress callback for scrape runs.
pub trait ScrapeProgress: Send + Sync {
    /// Called once per link as soon as its result is collected.
    fn page_done(&self, url: &str, ok: bool, current: usize, total: usize);
}

/// No-op progress for headless/test usage.
pub struct SilentScrapeProgress;

impl ScrapeProgress for SilentScrapeProgress {
    fn page_done(&self, _url: &str, _ok: bool, _current: usize, _total: usize) {}
}

// ---------------------------------------------------------------------------
// Scraper
// ---------------------------------------------------------------------------

/// Concurrent page fetcher with per-URL retry.
pub struct Scraper {
    config: ScrapeConfig,
    client: Client,
}

impl Scraper {
    /// Create a new scraper with the given configuration.
    pub fn new(config: ScrapeConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SiteQaError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    /// Fetch every link and return one document per link, in input order.
    #[instrument(skip_all, fields(links = links.len()))]
    pub async fn scrape(
        &self,
        links: Vec<LinkRecord>,
        progress: &dyn ScrapeProgress,
    ) -> (ScrapeReport, Vec<ScrapedDocument>) {
        let start_time = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1) as usize));
        let retries = self.config.retries.max(1);
        let retry_delay = Duration::from_secs(self.config.retry_delay_secs);

        info!(
            concurrency = self.config.concurrency,
            retries,
            timeout_secs = self.config.timeout_secs,
            "starting scrape"
        );

        let handles: Vec<_> = links
            .iter()
            .map(|link| {
                let client = self.client.clone();
                let sem = semaphore.clone();
                let url = link.url.clone();
                tokio::spawn(async move {
                    let _permit = sem.acquire_owned().await.ok()?;
                    fetch_text(&client, &url, retries, retry_delay).await
                })
            })
            .collect();

        let total = links.len();
        let mut documents = Vec::with_capacity(total);
        let mut pages_failed = 0;

        for (i, (link, handle)) in links.into_iter().zip(handles).enumerate() {
            let text = match handle.await {
                Ok(text) => text,
                Err(e) => {
                    warn!(url = %link.url, error = %e, "fetch task failed");
                    None
                }
            };
            let ok = text.is_some();
            progress.page_done(&link.url, ok, i + 1, total);

            let html_text = text.unwrap_or_else(|| {
                pages_failed += 1;
                FETCH_FAILED_SENTINEL.to_string()
            });
            documents.push(link.into_document(html_text));
        }

        let report = ScrapeReport {
            pages_fetched: total - pages_failed,
            pages_failed,
            duration: start_time.elapsed(),
        };

        info!(
            pages_fetched = report.pages_fetched,
            pages_failed = report.pages_failed,
            duration_ms = report.duration.as_millis(),
            "scrape completed"
        );

        (report, documents)
    }

    /// Read the link table, scrape it, and write the corpus JSON.
    pub async fn export_corpus(
        &self,
        links_path: &Path,
        out_path: &Path,
        progress: &dyn ScrapeProgress,
    ) -> Result<ScrapeReport> {
        let links = siteqa_storage::load_link_table(links_path)?;
        let (report, documents) = self.scrape(links, progress).await;
        siteqa_storage::save_corpus(out_path, &documents)?;
        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// Page fetching
// ---------------------------------------------------------------------------

/// Fetch a page with retries and extract its text. `None` if every attempt
/// failed or the page has no text.
async fn fetch_text(
    client: &Client,
    url: &str,
    retries: u32,
    retry_delay: Duration,
) -> Option<String> {
    for attempt in 1..=retries {
        match fetch_page(client, url).await {
            Ok(body) => {
                let text = html_to_text(&body);
                if text.is_empty() {
                    warn!(url, "page has no extractable text");
                    return None;
                }
                return Some(text);
            }
            Err(e) => {
                warn!(url, attempt, error = %e, "fetch failed");
                if attempt < retries && !retry_delay.is_zero() {
                    tokio::time::sleep(retry_delay).await;
                }
            }
        }
    }
    None
}

/// Fetch one page body, decoded with the charset the server declares.
async fn fetch_page(client: &Client, url: &str) -> Result<String> {
    debug!(url, "fetching page");

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| SiteQaError::Network(format!("{url}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(SiteQaError::Network(format!("{url}: HTTP {status}")));
    }

    response
        .text()
        .await
        .map_err(|e| SiteQaError::Network(format!("{url}: body read failed: {e}")))
}
