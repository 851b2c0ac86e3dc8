//! SiteQA CLI: Thai website question answering.
//!
//! Answers questions from a scraped website corpus with a local Ollama
//! model, and lists related products/services from the catalog.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
