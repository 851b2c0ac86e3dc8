//! Word-level tokenizer shared by the corpus, the catalog, and questions.
//!
//! Thai does not put spaces between words, so segmentation goes through
//! ICU4X's word segmenter, which carries a Thai dictionary. Latin text
//! follows the usual UAX #29 word boundaries.

use icu_segmenter::WordSegmenter;

/// Tokens shorter than this (in characters) are dropped.
const MIN_TOKEN_CHARS: usize = 2;

thread_local! {
    static SEGMENTER: WordSegmenter = WordSegmenter::new_auto();
}

/// Lower-case `text` and split it into word tokens.
///
/// Punctuation, whitespace, and single-character pieces are discarded.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    if lowered.trim().is_empty() {
        return Vec::new();
    }

    SEGMENTER.with(|segmenter| {
        let breaks: Vec<usize> = segmenter.segment_str(&lowered).collect();
        breaks
            .windows(2)
            .filter_map(|w| {
                let piece = lowered[w[0]..w[1]].trim();
                is_token(piece).then(|| piece.to_string())
            })
            .collect()
    })
}

fn is_token(piece: &str) -> bool {
    piece.chars().count() >= MIN_TOKEN_CHARS && piece.chars().any(char::is_alphanumeric)
}
