//! Question answering for SiteQA.
//!
//! This crate ties retrieval and generation together: select the best page,
//! compose a prompt, ask the model, and append related catalog rows
//! (see [`Answerer::answer`]).

pub mod answer;
pub mod generation;
pub mod prompt;
pub mod render;

pub use answer::{
    AnswerOptions, AnswerTrace, Answerer, ContextHit, GenerationOutcome, Snapshot,
};
pub use generation::{Generator, OllamaGenerator, SYSTEM_PROMPT};
pub use prompt::{DEFAULT_MAX_CONTEXT_CHARS, build_prompt, truncate_chars};
pub use render::{GENERATION_UNAVAILABLE, NOT_FOUND, catalog_table};
