//! TF-IDF vector space fitted on a fixed set of documents.
//!
//! Weighting:
//! - `tf` is the raw term count
//! - `idf(t) = ln((1 + n) / (1 + df(t))) + 1`
//! - every vector (documents and queries) is L2-normalized, so a dot product
//!   is the cosine similarity
//!
//! The vocabulary comes only from the fitted documents. Query terms outside
//! it are ignored.

use std::collections::HashMap;

use crate::tokenize::tokenize;

/// A sparse, L2-normalized vector: `(term index, weight)` sorted by term index.
type SparseVector = Vec<(usize, f64)>;

/// A question projected into a [`TfIdfSpace`].
#[derive(Debug, Clone, Default)]
pub struct QueryVector {
    weights: HashMap<usize, f64>,
}

impl QueryVector {
    /// True when no query term is in the vocabulary.
    pub fn is_zero(&self) -> bool {
        self.weights.is_empty()
    }
}

/// Fitted TF-IDF space: vocabulary, idf weights, and one row per document.
#[derive(Debug, Clone, Default)]
pub struct TfIdfSpace {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    rows: Vec<SparseVector>,
}

impl TfIdfSpace {
    /// Tokenize and fit over `documents`.
    pub fn fit<I, S>(documents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tokenized: Vec<Vec<String>> = documents
            .into_iter()
            .map(|d| tokenize(d.as_ref()))
            .collect();
        Self::fit_tokens(&tokenized)
    }

    /// Fit over already-tokenized documents.
    pub fn fit_tokens(documents: &[Vec<String>]) -> Self {
        let mut vocabulary: HashMap<String, usize> = HashMap::new();
        let mut df: Vec<usize> = Vec::new();
        let mut counts: Vec<HashMap<usize, usize>> = Vec::with_capacity(documents.len());

        for tokens in documents {
            let mut doc_counts: HashMap<usize, usize> = HashMap::new();
            for token in tokens {
                let next = vocabulary.len();
                let idx = *vocabulary.entry(token.clone()).or_insert_with(|| {
                    df.push(0);
                    next
                });
                *doc_counts.entry(idx).or_insert(0) += 1;
            }
            for idx in doc_counts.keys() {
                df[*idx] += 1;
            }
            counts.push(doc_counts);
        }

        let n = documents.len() as f64;
        let idf: Vec<f64> = df
            .iter()
            .map(|&d| ((1.0 + n) / (1.0 + d as f64)).ln() + 1.0)
            .collect();

        let rows = counts
            .into_iter()
            .map(|doc_counts| {
                let mut row: SparseVector = doc_counts
                    .into_iter()
                    .map(|(idx, tf)| (idx, tf as f64 * idf[idx]))
                    .collect();
                row.sort_unstable_by_key(|(idx, _)| *idx);
                normalize(&mut row);
                row
            })
            .collect();

        Self {
            vocabulary,
            idf,
            rows,
        }
    }

    /// Number of fitted documents.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of distinct terms.
    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    /// Project a token sequence into the space.
    pub fn project(&self, tokens: &[String]) -> QueryVector {
        let mut counts: HashMap<usize, usize> = HashMap::new();
        for token in tokens {
            if let Some(&idx) = self.vocabulary.get(token) {
                *counts.entry(idx).or_insert(0) += 1;
            }
        }

        let mut row: SparseVector = counts
            .into_iter()
            .map(|(idx, tf)| (idx, tf as f64 * self.idf[idx]))
            .collect();
        row.sort_unstable_by_key(|(idx, _)| *idx);
        normalize(&mut row);

        QueryVector {
            weights: row.into_iter().collect(),
        }
    }

    /// Cosine similarity of `query` against every document, in fit order.
    pub fn scores(&self, query: &QueryVector) -> Vec<f64> {
        if query.is_zero() {
            return vec![0.0; self.rows.len()];
        }
        self.rows
            .iter()
            .map(|row| {
                row.iter()
                    .filter_map(|(idx, w)| query.weights.get(idx).map(|q| q * w))
                    .sum()
            })
            .collect()
    }

    /// Tokenize `text`, project it, and score every document.
    pub fn score_text(&self, text: &str) -> Vec<f64> {
        self.scores(&self.project(&tokenize(text)))
    }
}

fn normalize(row: &mut SparseVector) {
    let norm = row.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
    if norm > 0.0 {
        for (_, w) in row.iter_mut() {
            *w /= norm;
        }
    }
}
