//! Best-context selection over the scraped corpus.

use siteqa_shared::ScrapedDocument;
use tracing::debug;

use crate::tfidf::TfIdfSpace;

/// The text a document is indexed under: page text, header, then tags.
pub fn retrieval_key(doc: &ScrapedDocument) -> String {
    format!("{} {} {}", doc.html_text, doc.header, doc.tag)
}

/// The single best-scoring document for a question.
#[derive(Debug, Clone, Copy)]
pub struct ContextMatch<'a> {
    /// Position of the document in corpus order.
    pub index: usize,
    /// Cosine similarity, always > 0.
    pub score: f64,
    pub document: &'a ScrapedDocument,
}

/// Immutable TF-IDF index over the scraped corpus.
#[derive(Debug, Clone, Default)]
pub struct DocumentIndex {
    documents: Vec<ScrapedDocument>,
    space: TfIdfSpace,
}

impl DocumentIndex {
    /// Build the index. The corpus is owned by the index from here on.
    pub fn build(documents: Vec<ScrapedDocument>) -> Self {
        let space = TfIdfSpace::fit(documents.iter().map(retrieval_key));
        debug!(
            documents = documents.len(),
            vocabulary = space.vocabulary_len(),
            "document index built"
        );
        Self { documents, space }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Similarity of `question` to every document, in corpus order.
    pub fn scores(&self, question: &str) -> Vec<f64> {
        self.space.score_text(question)
    }

    /// Return the highest-scoring document, or `None` when nothing shares
    /// vocabulary with the question. Ties go to the earliest document.
    pub fn select(&self, question: &str) -> Option<ContextMatch<'_>> {
        let scores = self.scores(question);

        let mut best: Option<(usize, f64)> = None;
        for (index, &score) in scores.iter().enumerate() {
            if best.is_none_or(|(_, top)| score > top) {
                best = Some((index, score));
            }
        }

        let (index, score) = best?;
        if score <= 0.0 {
            debug!("no document shares vocabulary with the question");
            return None;
        }

        debug!(index, score, "best context selected");
        Some(ContextMatch {
            index,
            score,
            document: &self.documents[index],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(url: &str, html_text: &str, header: &str, tag: &str) -> ScrapedDocument {
        ScrapedDocument {
            url: url.into(),
            html_text: html_text.into(),
            header: header.into(),
            tag: tag.into(),
            ..Default::default()
        }
    }

    #[test]
    fn retrieval_key_order() {
        let d = doc("u", "text", "head", "tags");
        assert_eq!(retrieval_key(&d), "text head tags");
    }

    #[test]
    fn selects_single_matching_document() {
        let index = DocumentIndex::build(vec![doc(
            "http://x/1",
            "TISTR offers biotechnology services",
            "Services",
            "",
        )]);
        let m = index
            .select("What biotechnology services exist?")
            .expect("match");
        assert_eq!(m.document.url, "http://x/1");
        assert!(m.score > 0.0);
    }

    #[test]
    fn selected_score_is_maximal() {
        let index = DocumentIndex::build(vec![
            doc("http://x/1", "food safety testing", "Food", ""),
            doc("http://x/2", "microbial culture collection", "Biology", "culture"),
            doc("http://x/3", "calibration of instruments", "Metrology", ""),
        ]);
        let question = "microbial culture services";
        let m = index.select(question).expect("match");
        let scores = index.scores(question);
        let max = scores.iter().cloned().fold(f64::MIN, f64::max);
        assert_eq!(m.score, max);
        assert_eq!(m.document.url, "http://x/2");
    }

    #[test]
    fn header_and_tag_are_searchable() {
        let index = DocumentIndex::build(vec![
            doc("http://x/1", "", "", "fermentation"),
            doc("http://x/2", "", "Packaging", ""),
        ]);
        assert_eq!(index.select("packaging").expect("match").index, 1);
        assert_eq!(index.select("fermentation").expect("match").index, 0);
    }

    #[test]
    fn no_overlap_is_no_match() {
        let index = DocumentIndex::build(vec![doc("http://x/1", "alpha beta", "", "")]);
        assert!(index.select("completely unrelated words").is_none());
    }

    #[test]
    fn empty_corpus_is_no_match() {
        let index = DocumentIndex::build(Vec::new());
        assert!(index.is_empty());
        assert!(index.select("anything at all").is_none());
    }

    #[test]
    fn blank_question_is_no_match() {
        let index = DocumentIndex::build(vec![doc("http://x/1", "alpha beta", "", "")]);
        assert!(index.select("").is_none());
        assert!(index.select("   ").is_none());
    }

    #[test]
    fn thai_question_finds_thai_page() {
        let index = DocumentIndex::build(vec![
            doc("http://x/food", "บริการตรวจสอบคุณภาพอาหาร", "อาหาร", ""),
            doc("http://x/bio", "บริการเทคโนโลยีชีวภาพและจุลินทรีย์", "ชีวภาพ", ""),
        ]);
        let m = index.select("มีบริการเกี่ยวกับจุลินทรีย์ไหม").expect("match");
        assert_eq!(m.document.url, "http://x/bio");
    }

    #[test]
    fn selection_is_repeatable() {
        let index = DocumentIndex::build(vec![
            doc("http://x/1", "shared words here", "", ""),
            doc("http://x/2", "shared words here", "", ""),
        ]);
        let a = index.select("shared words").expect("match");
        let b = index.select("shared words").expect("match");
        assert_eq!(a.index, b.index);
        assert_eq!(a.score, b.score);
    }
}
