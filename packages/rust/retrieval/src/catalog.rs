//! Product/service catalog matching.
//!
//! Two stages, never mixed:
//! 1. identifier short-circuit: code-like tokens in the question matched as
//!    substrings of row IDs
//! 2. ranked fallback: TF-IDF over `id name center link`, positive scores only

use std::sync::LazyLock;

use regex::Regex;
use siteqa_shared::CatalogRow;
use tracing::debug;

use crate::tfidf::TfIdfSpace;

/// Default number of catalog rows returned for one question.
pub const DEFAULT_MAX_ROWS: usize = 5;

/// Center filter value meaning "do not filter by center".
pub const ALL_CENTERS: &str = "ทั้งหมด";

static IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9_-]{3,}").expect("identifier pattern is valid"));

/// Which stage produced a [`CatalogMatches`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    /// A code-like token in the question matched row IDs.
    Identifier,
    /// TF-IDF ranking.
    Ranked,
    /// Nothing matched.
    None,
}

/// Up to K catalog rows related to a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogMatches {
    pub strategy: MatchStrategy,
    pub rows: Vec<CatalogRow>,
}

impl CatalogMatches {
    fn empty() -> Self {
        Self {
            strategy: MatchStrategy::None,
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Pull identifier-looking tokens out of a question: runs of three or more
/// ASCII letters, digits, `-` or `_`, lower-cased, with no Thai characters.
pub fn extract_identifiers(question: &str) -> Vec<String> {
    let lowered = question.to_lowercase();
    IDENTIFIER_RE
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|t| !t.chars().any(is_thai))
        .map(str::to_string)
        .collect()
}

fn is_thai(c: char) -> bool {
    ('\u{0E01}'..='\u{0E59}').contains(&c)
}

/// Immutable catalog plus its TF-IDF space.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    rows: Vec<CatalogRow>,
    space: TfIdfSpace,
}

impl Catalog {
    pub fn new(rows: Vec<CatalogRow>) -> Self {
        let space = TfIdfSpace::fit(
            rows.iter()
                .map(|r| format!("{} {} {} {}", r.id, r.name, r.center, r.link)),
        );
        debug!(
            rows = rows.len(),
            vocabulary = space.vocabulary_len(),
            "catalog index built"
        );
        Self { rows, space }
    }

    pub fn rows(&self) -> &[CatalogRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Find up to `max_rows` rows related to `question`.
    pub fn find_related(&self, question: &str, max_rows: usize) -> CatalogMatches {
        if self.rows.is_empty() || max_rows == 0 {
            return CatalogMatches::empty();
        }

        let identifiers = extract_identifiers(question);
        if !identifiers.is_empty() {
            let rows: Vec<CatalogRow> = self
                .rows
                .iter()
                .filter(|row| {
                    let id = row.id.to_lowercase();
                    identifiers.iter().any(|t| id.contains(t.as_str()))
                })
                .take(max_rows)
                .cloned()
                .collect();
            if !rows.is_empty() {
                debug!(?identifiers, hits = rows.len(), "catalog identifier match");
                return CatalogMatches {
                    strategy: MatchStrategy::Identifier,
                    rows,
                };
            }
        }

        let rows = self.rank(question, max_rows);
        if rows.is_empty() {
            debug!("no catalog rows related to the question");
            return CatalogMatches::empty();
        }
        debug!(hits = rows.len(), "catalog ranked match");
        CatalogMatches {
            strategy: MatchStrategy::Ranked,
            rows,
        }
    }

    /// Positive-scoring rows, best first; ties keep table order.
    fn rank(&self, question: &str, max_rows: usize) -> Vec<CatalogRow> {
        let mut scored: Vec<(usize, f64)> = self
            .space
            .score_text(question)
            .into_iter()
            .enumerate()
            .filter(|(_, score)| *score > 0.0)
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored
            .into_iter()
            .take(max_rows)
            .map(|(i, _)| self.rows[i].clone())
            .collect()
    }

    /// Browse filter: `center` is a case-insensitive literal substring
    /// ([`ALL_CENTERS`] or blank disables it); `keyword` must appear in any
    /// of the four fields.
    pub fn filter(&self, keyword: &str, center: &str) -> Vec<&CatalogRow> {
        let center = center.trim().to_lowercase();
        let keyword = keyword.trim().to_lowercase();
        let by_center = !center.is_empty() && center != ALL_CENTERS;

        self.rows
            .iter()
            .filter(|row| !by_center || row.center.to_lowercase().contains(&center))
            .filter(|row| {
                keyword.is_empty()
                    || [&row.id, &row.name, &row.center, &row.link]
                        .iter()
                        .any(|field| field.to_lowercase().contains(&keyword))
            })
            .collect()
    }

    /// Distinct non-blank centers, sorted.
    pub fn centers(&self) -> Vec<&str> {
        let mut centers: Vec<&str> = self
            .rows
            .iter()
            .map(|r| r.center.as_str())
            .filter(|c| !c.trim().is_empty())
            .collect();
        centers.sort_unstable();
        centers.dedup();
        centers
    }
}
