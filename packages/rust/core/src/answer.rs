//! Question answering over a corpus/catalog snapshot.
//!
//! An [`Answerer`] owns the current [`Snapshot`] behind an `Arc`. Each question
//! grabs the snapshot once and works on it to completion, so a concurrent
//! [`Answerer::reload`] only affects questions asked after the swap.

use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use tracing::{info, instrument, warn};

use siteqa_retrieval::{Catalog, CatalogMatches, DocumentIndex};
use siteqa_shared::{AppConfig, CatalogRow, DataConfig, Result, ScrapedDocument, SiteQaError};

use crate::generation::Generator;
use crate::prompt::build_prompt;
use crate::render::{
    GENERATION_UNAVAILABLE, LABEL_POSSIBLY_RELATED, LABEL_RELATED, NOT_FOUND, reference_line,
    with_catalog_block,
};

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Immutable corpus index and catalog, built together.
#[derive(Debug, Default)]
pub struct Snapshot {
    index: DocumentIndex,
    catalog: Catalog,
}

impl Snapshot {
    pub fn new(documents: Vec<ScrapedDocument>, catalog_rows: Vec<CatalogRow>) -> Self {
        Self {
            index: DocumentIndex::build(documents),
            catalog: Catalog::new(catalog_rows),
        }
    }

    /// Load the corpus and catalog named in the `[data]` config section.
    /// A missing corpus is an error; a missing catalog is an empty one.
    pub fn load(data: &DataConfig) -> Result<Self> {
        let documents = siteqa_storage::load_corpus(Path::new(&data.corpus_path))?;
        let rows = siteqa_storage::load_catalog(Path::new(&data.catalog_path))?;
        let snapshot = Self::new(documents, rows);
        info!(
            documents = snapshot.index.len(),
            catalog_rows = snapshot.catalog.len(),
            "snapshot loaded"
        );
        Ok(snapshot)
    }

    pub fn index(&self) -> &DocumentIndex {
        &self.index
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }
}

// ---------------------------------------------------------------------------
// Options and trace
// ---------------------------------------------------------------------------

/// Per-answerer settings.
#[derive(Debug, Clone)]
pub struct AnswerOptions {
    /// Model name handed to the generator.
    pub model: String,
    /// Upper bound on one generation call.
    pub timeout: Duration,
    pub max_context_chars: usize,
    pub max_catalog_rows: usize,
}

impl AnswerOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            model: config.generation.model.clone(),
            timeout: config.generation.timeout(),
            max_context_chars: config.retrieval.max_context_chars,
            max_catalog_rows: config.retrieval.max_catalog_rows,
        }
    }
}

impl Default for AnswerOptions {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// What happened to the generation step of one answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// No page matched, so the model was not called.
    Skipped,
    Completed,
    /// The call failed or timed out; the answer carries the degraded message.
    Failed,
}

/// The page an answer was grounded on.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextHit {
    pub index: usize,
    pub score: f64,
    pub url: String,
}

/// An answer plus the decisions that produced it.
#[derive(Debug, Clone)]
pub struct AnswerTrace {
    pub text: String,
    pub context: Option<ContextHit>,
    pub catalog: CatalogMatches,
    pub generation: GenerationOutcome,
}

// ---------------------------------------------------------------------------
// Answerer
// ---------------------------------------------------------------------------

/// Answers questions from the current snapshot, calling the generator at
/// most once per question.
pub struct Answerer {
    snapshot: RwLock<Arc<Snapshot>>,
    generator: Arc<dyn Generator>,
    options: AnswerOptions,
}

impl Answerer {
    pub fn new(snapshot: Snapshot, generator: Arc<dyn Generator>, options: AnswerOptions) -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(snapshot)),
            generator,
            options,
        }
    }

    /// The snapshot new questions will be answered from.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Swap in a new snapshot. Questions already in flight finish on the old one.
    pub fn reload(&self, snapshot: Snapshot) {
        let snapshot = Arc::new(snapshot);
        info!(
            documents = snapshot.index.len(),
            catalog_rows = snapshot.catalog.len(),
            "snapshot swapped"
        );
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = snapshot;
    }

    /// Answer a question. Never fails: generation problems produce the
    /// degraded message instead.
    pub async fn answer(&self, question: &str) -> String {
        self.answer_with_trace(question).await.text
    }

    #[instrument(skip_all, fields(question_chars = question.chars().count()))]
    pub async fn answer_with_trace(&self, question: &str) -> AnswerTrace {
        let snapshot = self.snapshot();
        let catalog = snapshot
            .catalog
            .find_related(question, self.options.max_catalog_rows);

        let Some(hit) = snapshot.index.select(question) else {
            info!(catalog_rows = catalog.rows.len(), "no related page");
            let text =
                with_catalog_block(NOT_FOUND.to_string(), LABEL_POSSIBLY_RELATED, &catalog.rows);
            return AnswerTrace {
                text,
                context: None,
                catalog,
                generation: GenerationOutcome::Skipped,
            };
        };

        info!(
            index = hit.index,
            score = hit.score,
            url = %hit.document.url,
            catalog_rows = catalog.rows.len(),
            "answering from page"
        );

        let prompt = build_prompt(question, hit.document, self.options.max_context_chars);
        let (reply, generation) = self.generate(&prompt).await;

        let head = format!("{reply}\n\n{}", reference_line(&hit.document.url));
        AnswerTrace {
            text: with_catalog_block(head, LABEL_RELATED, &catalog.rows),
            context: Some(ContextHit {
                index: hit.index,
                score: hit.score,
                url: hit.document.url.clone(),
            }),
            catalog,
            generation,
        }
    }

    async fn generate(&self, prompt: &str) -> (String, GenerationOutcome) {
        let call = self.generator.generate(prompt, &self.options.model);
        let result = match tokio::time::timeout(self.options.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(SiteQaError::generation(format!(
                "no reply within {}s",
                self.options.timeout.as_secs_f64()
            ))),
        };

        match result {
            Ok(reply) => (reply.trim().to_string(), GenerationOutcome::Completed),
            Err(e) => {
                warn!(error = %e, "generation failed, returning degraded answer");
                (GENERATION_UNAVAILABLE.to_string(), GenerationOutcome::Failed)
            }
        }
    }
}

impl std::fmt::Debug for Answerer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Answerer")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use siteqa_retrieval::MatchStrategy;
    use tokio::sync::Notify;

    use crate::render::NO_LINK;

    enum Behavior {
        Reply(&'static str),
        Fail,
        Hang,
    }

    struct MockGenerator {
        behavior: Behavior,
        calls: AtomicUsize,
        prompts: Mutex<Vec<String>>,
    }

    impl MockGenerator {
        fn new(behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                behavior,
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Generator for MockGenerator {
        async fn generate(&self, prompt: &str, _model: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            match self.behavior {
                Behavior::Reply(text) => Ok(format!("  {text}\n")),
                Behavior::Fail => Err(SiteQaError::generation("connection refused")),
                Behavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok("too late".into())
                }
            }
        }
    }

    fn options() -> AnswerOptions {
        AnswerOptions {
            model: "gemma2".into(),
            timeout: Duration::from_secs(5),
            max_context_chars: 10_000,
            max_catalog_rows: 5,
        }
    }

    fn biotech_doc() -> ScrapedDocument {
        ScrapedDocument {
            url: "http://x/1".into(),
            header: "Services".into(),
            html_text: "TISTR offers biotechnology services".into(),
            ..Default::default()
        }
    }

    fn answerer(snapshot: Snapshot, generator: Arc<MockGenerator>) -> Answerer {
        Answerer::new(snapshot, generator, options())
    }

    #[tokio::test]
    async fn empty_corpus_and_catalog_is_exactly_not_found() {
        let generator = MockGenerator::new(Behavior::Reply("unused"));
        let answerer = answerer(Snapshot::default(), generator.clone());

        assert_eq!(answerer.answer("อะไรก็ได้").await, NOT_FOUND);
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn no_overlap_skips_generation() {
        let generator = MockGenerator::new(Behavior::Reply("unused"));
        let answerer = answerer(Snapshot::new(vec![biotech_doc()], vec![]), generator.clone());

        let trace = answerer.answer_with_trace("completely unrelated words").await;
        assert_eq!(trace.text, NOT_FOUND);
        assert!(trace.context.is_none());
        assert_eq!(trace.generation, GenerationOutcome::Skipped);
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn no_page_but_catalog_hit_appends_possible_products() {
        let generator = MockGenerator::new(Behavior::Reply("unused"));
        let catalog = vec![CatalogRow::new("INNOAG-01", "X", "Y", "not-a-url")];
        let answerer = answerer(Snapshot::new(vec![biotech_doc()], catalog), generator.clone());

        let answer = answerer.answer("ราคา INNOAG-01").await;
        assert_eq!(
            answer,
            format!(
                "{NOT_FOUND}\n\n---\n\n{LABEL_POSSIBLY_RELATED}\n\n\
                 | ID | ชื่อสินค้า | ศูนย์ | link |\n|---|---|---|---|\n\
                 | INNOAG-01 | X | Y | {NO_LINK} |"
            )
        );
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn selected_page_is_cited_after_reply() {
        let generator = MockGenerator::new(Behavior::Reply("มีบริการเทคโนโลยีชีวภาพ"));
        let answerer = answerer(Snapshot::new(vec![biotech_doc()], vec![]), generator.clone());

        let trace = answerer
            .answer_with_trace("What biotechnology services exist?")
            .await;

        assert_eq!(trace.text, "มีบริการเทคโนโลยีชีวภาพ\n\n🔗 อ้างอิง: http://x/1");
        assert_eq!(trace.context.as_ref().map(|c| c.index), Some(0));
        assert!(trace.context.as_ref().is_some_and(|c| c.score > 0.0));
        assert_eq!(trace.generation, GenerationOutcome::Completed);
        assert_eq!(generator.calls(), 1);

        let prompts = generator.prompts.lock().unwrap();
        assert!(prompts[0].contains("คำถาม:\nWhat biotechnology services exist?"));
        assert!(prompts[0].contains("TISTR offers biotechnology services"));
    }

    #[tokio::test]
    async fn identifier_row_listed_with_placeholder_link() {
        let generator = MockGenerator::new(Behavior::Reply("ตอบ"));
        let catalog = vec![
            CatalogRow::new("FOOD-10", "biotechnology drink", "Z", "http://x/f"),
            CatalogRow::new("INNOAG-01", "X", "Y", "not-a-url"),
        ];
        let answerer = answerer(Snapshot::new(vec![biotech_doc()], catalog), generator.clone());

        let trace = answerer
            .answer_with_trace("biotechnology services for INNOAG-01")
            .await;

        assert_eq!(trace.catalog.strategy, MatchStrategy::Identifier);
        assert_eq!(trace.catalog.rows.len(), 1);
        assert_eq!(
            trace.text,
            format!(
                "ตอบ\n\n🔗 อ้างอิง: http://x/1\n\n---\n\n{LABEL_RELATED}\n\n\
                 | ID | ชื่อสินค้า | ศูนย์ | link |\n|---|---|---|---|\n\
                 | INNOAG-01 | X | Y | {NO_LINK} |"
            )
        );
    }

    #[tokio::test]
    async fn catalog_rows_capped_by_options() {
        let generator = MockGenerator::new(Behavior::Reply("ตอบ"));
        let catalog = (0..8)
            .map(|i| CatalogRow::new(format!("P-{i}"), "probiotic", "c", ""))
            .collect();
        let answerer = Answerer::new(
            Snapshot::new(vec![], catalog),
            generator,
            AnswerOptions {
                max_catalog_rows: 3,
                ..options()
            },
        );

        let trace = answerer.answer_with_trace("probiotic").await;
        assert_eq!(trace.catalog.rows.len(), 3);
        assert_eq!(trace.text.matches("| probiotic |").count(), 3);
    }

    #[tokio::test]
    async fn generation_failure_degrades_but_still_cites() {
        let generator = MockGenerator::new(Behavior::Fail);
        let answerer = answerer(Snapshot::new(vec![biotech_doc()], vec![]), generator.clone());

        let trace = answerer.answer_with_trace("biotechnology").await;
        assert_eq!(
            trace.text,
            format!("{GENERATION_UNAVAILABLE}\n\n🔗 อ้างอิง: http://x/1")
        );
        assert_eq!(trace.generation, GenerationOutcome::Failed);
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn generation_timeout_degrades() {
        let generator = MockGenerator::new(Behavior::Hang);
        let answerer = Answerer::new(
            Snapshot::new(vec![biotech_doc()], vec![]),
            generator,
            AnswerOptions {
                timeout: Duration::from_millis(50),
                ..options()
            },
        );

        let trace = answerer.answer_with_trace("biotechnology").await;
        assert!(trace.text.starts_with(GENERATION_UNAVAILABLE));
        assert_eq!(trace.generation, GenerationOutcome::Failed);
    }

    #[tokio::test]
    async fn same_question_same_selection() {
        let generator = MockGenerator::new(Behavior::Reply("ตอบ"));
        let docs = vec![
            biotech_doc(),
            ScrapedDocument {
                url: "http://x/2".into(),
                html_text: "food testing laboratory".into(),
                ..Default::default()
            },
        ];
        let catalog = vec![
            CatalogRow::new("A-1", "food kit", "c", ""),
            CatalogRow::new("A-2", "testing kit", "c", ""),
        ];
        let answerer = answerer(Snapshot::new(docs, catalog), generator);

        let first = answerer.answer_with_trace("food testing kit").await;
        let second = answerer.answer_with_trace("food testing kit").await;
        assert_eq!(first.context, second.context);
        assert_eq!(first.catalog, second.catalog);
        assert_eq!(first.text, second.text);
    }

    #[tokio::test]
    async fn reload_swaps_for_new_questions_only() {
        let generator = MockGenerator::new(Behavior::Reply("ตอบ"));
        let answerer = answerer(Snapshot::default(), generator);

        let before = answerer.snapshot();
        assert_eq!(answerer.answer("biotechnology").await, NOT_FOUND);

        answerer.reload(Snapshot::new(vec![biotech_doc()], vec![]));

        assert!(before.index().is_empty());
        assert_eq!(answerer.snapshot().index().len(), 1);
        assert!(answerer.answer("biotechnology").await.ends_with("http://x/1"));
    }

    /// Blocks inside `generate` until released, so a test can act while a
    /// question is suspended.
    struct GatedGenerator {
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl Generator for GatedGenerator {
        async fn generate(&self, _prompt: &str, _model: &str) -> Result<String> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok("ตอบ".into())
        }
    }

    fn page(url: &str, text: &str) -> ScrapedDocument {
        ScrapedDocument {
            url: url.into(),
            html_text: text.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn in_flight_question_keeps_its_snapshot_across_reload() {
        let gate = Arc::new(GatedGenerator {
            entered: Notify::new(),
            release: Notify::new(),
        });
        let answerer = Arc::new(Answerer::new(
            Snapshot::new(vec![page("http://a/1", "biotechnology services")], vec![]),
            gate.clone(),
            options(),
        ));

        let in_flight = tokio::spawn({
            let answerer = answerer.clone();
            async move { answerer.answer_with_trace("biotechnology").await }
        });

        gate.entered.notified().await;
        answerer.reload(Snapshot::new(
            vec![page("http://b/1", "biotechnology laboratory")],
            vec![],
        ));
        gate.release.notify_one();

        let first = in_flight.await.unwrap();
        assert_eq!(first.context.map(|c| c.url).as_deref(), Some("http://a/1"));
        assert!(first.text.ends_with("🔗 อ้างอิง: http://a/1"));

        gate.release.notify_one();
        let second = answerer.answer("biotechnology").await;
        assert!(second.ends_with("🔗 อ้างอิง: http://b/1"));
    }

    #[tokio::test]
    async fn concurrent_questions_share_one_answerer() {
        let generator = MockGenerator::new(Behavior::Reply("ตอบ"));
        let answerer = Arc::new(answerer(
            Snapshot::new(
                vec![biotech_doc(), page("http://x/2", "food testing laboratory")],
                vec![],
            ),
            generator.clone(),
        ));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let answerer = answerer.clone();
                let question = if i % 2 == 0 { "biotechnology" } else { "food testing" };
                tokio::spawn(async move { answerer.answer_with_trace(question).await })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let trace = handle.await.unwrap();
            let expected = if i % 2 == 0 { "http://x/1" } else { "http://x/2" };
            assert_eq!(trace.context.map(|c| c.url).as_deref(), Some(expected));
        }
        assert_eq!(generator.calls(), 8);
    }

    #[tokio::test]
    async fn snapshot_loads_from_fixture_files() {
        let data = DataConfig {
            corpus_path: "../../../fixtures/json/corpus.fixture.json".into(),
            catalog_path: "../../../fixtures/csv/products.fixture.csv".into(),
        };
        let snapshot = Snapshot::load(&data).expect("load snapshot");
        assert_eq!(snapshot.index().len(), 4);
        assert_eq!(snapshot.catalog().len(), 4);

        let generator = MockGenerator::new(Behavior::Reply("ตอบ"));
        let answerer = answerer(snapshot, generator);
        let trace = answerer.answer_with_trace("biotechnology services").await;
        assert_eq!(
            trace.context.map(|c| c.url).as_deref(),
            Some("https://www.tistr.or.th/services/biotech")
        );
    }

    #[test]
    fn missing_corpus_fails_to_load() {
        let data = DataConfig {
            corpus_path: std::env::temp_dir()
                .join(format!("siteqa-missing-{}.json", uuid::Uuid::now_v7()))
                .to_string_lossy()
                .into_owned(),
            catalog_path: "unused.csv".into(),
        };
        assert!(matches!(Snapshot::load(&data), Err(SiteQaError::Io { .. })));
    }
}
