//! CLI command definitions, routing, and tracing setup.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use siteqa_core::{AnswerOptions, Answerer, OllamaGenerator, Snapshot, catalog_table};
use siteqa_retrieval::{ALL_CENTERS, Catalog};
use siteqa_scraper::{ScrapeProgress, Scraper};
use siteqa_shared::{
    AppConfig, CatalogRow, config_file_path, init_config, init_config_at, load_config,
    load_config_from,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use url::Url;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// SiteQA — answer questions from a scraped website.
#[derive(Parser)]
#[command(
    name = "siteqa",
    version,
    about = "Answer Thai questions from a scraped website corpus and product catalog.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ~/.siteqa/siteqa.toml).
    #[arg(long, global = true, env = "SITEQA_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Answer a question, or read questions from stdin when none is given.
    Ask(AskArgs),

    /// Fetch every page in a link table and write the corpus JSON.
    Scrape {
        /// Link table CSV (ID, URL, Center, Header, NamePage, Tag).
        #[arg(long)]
        links: PathBuf,

        /// Output corpus file (defaults to the configured corpus path).
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Browse and filter the product/service catalog.
    Products {
        /// Keyword matched against ID, name, center, and link.
        #[arg(short, long)]
        keyword: Option<String>,

        /// Center filter (substring; "ทั้งหมด" means all).
        #[arg(short, long)]
        center: Option<String>,

        /// Write the filtered rows to a CSV file.
        #[arg(long)]
        export: Option<PathBuf>,

        /// List the distinct centers instead of rows.
        #[arg(long)]
        centers: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Arguments for `siteqa ask`. Flags override config values.
#[derive(Args, Debug)]
pub(crate) struct AskArgs {
    /// Question to answer.
    pub question: Option<String>,

    /// Corpus JSON file.
    #[arg(long)]
    pub corpus: Option<String>,

    /// Catalog CSV file.
    #[arg(long)]
    pub catalog: Option<String>,

    /// Ollama model name.
    #[arg(long)]
    pub model: Option<String>,

    /// Ollama server base URL.
    #[arg(long)]
    pub ollama_url: Option<String>,

    /// Generation timeout in seconds.
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr; answers to stdout.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "siteqa=info",
        1 => "siteqa=debug",
        _ => "siteqa=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Ask(args) => cmd_ask(resolve_config(config_path)?, args).await,
        Command::Scrape { links, out } => {
            cmd_scrape(resolve_config(config_path)?, &links, out.as_deref()).await
        }
        Command::Products {
            keyword,
            center,
            export,
            centers,
        } => cmd_products(
            &resolve_config(config_path)?,
            keyword.as_deref(),
            center.as_deref(),
            export.as_deref(),
            centers,
        ),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(config_path),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

/// Load config from `--config` if given, else the default location.
fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    Ok(match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    })
}

// ---------------------------------------------------------------------------
// ask
// ---------------------------------------------------------------------------

/// Apply `ask` flag overrides on top of the loaded config.
fn apply_ask_overrides(config: &mut AppConfig, args: &AskArgs) -> Result<()> {
    if let Some(corpus) = &args.corpus {
        config.data.corpus_path = corpus.clone();
    }
    if let Some(catalog) = &args.catalog {
        config.data.catalog_path = catalog.clone();
    }
    if let Some(model) = &args.model {
        config.generation.model = model.clone();
    }
    if let Some(base_url) = &args.ollama_url {
        Url::parse(base_url).map_err(|e| eyre!("invalid Ollama URL '{base_url}': {e}"))?;
        config.generation.base_url = base_url.clone();
    }
    if let Some(timeout_secs) = args.timeout_secs {
        config.generation.timeout_secs = timeout_secs;
    }
    config.validate()?;
    Ok(())
}

async fn cmd_ask(mut config: AppConfig, args: AskArgs) -> Result<()> {
    apply_ask_overrides(&mut config, &args)?;

    let snapshot = Snapshot::load(&config.data)?;
    let generator = Arc::new(OllamaGenerator::new(&config.generation)?);
    info!(
        model = %config.generation.model,
        ollama = %generator.base_url(),
        "ready to answer"
    );
    let answerer = Answerer::new(snapshot, generator, AnswerOptions::from_config(&config));

    match args.question {
        Some(question) => {
            let spinner = spinner("กำลังค้นหาคำตอบ...");
            let answer = answerer.answer(&question).await;
            spinner.finish_and_clear();
            println!("{answer}");
        }
        None => interactive(&answerer, &config).await?,
    }

    Ok(())
}

/// Read questions line by line until EOF or `:quit`. `:reload` re-reads the
/// corpus and catalog and swaps them in.
async fn interactive(answerer: &Answerer, config: &AppConfig) -> Result<()> {
    eprintln!("พิมพ์คำถามแล้วกด Enter (:reload โหลดข้อมูลใหม่, :quit ออก)");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        eprint!("> ");
        std::io::stderr().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        match line.trim() {
            "" => continue,
            ":quit" | ":q" => break,
            ":reload" => match Snapshot::load(&config.data) {
                Ok(snapshot) => {
                    answerer.reload(snapshot);
                    eprintln!("โหลดข้อมูลใหม่เรียบร้อย");
                }
                Err(e) => warn!(error = %e, "reload failed, keeping current data"),
            },
            question => {
                let answer = answerer.answer(question).await;
                println!("{answer}\n");
            }
        }
    }

    Ok(())
}

fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner
}

// ---------------------------------------------------------------------------
// scrape
// ---------------------------------------------------------------------------

/// Scrape progress shown as an indicatif bar; failed URLs are printed above it.
struct CliScrapeProgress {
    bar: ProgressBar,
}

impl CliScrapeProgress {
    fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{bar:30.cyan/blue} {pos}/{len} {wide_msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Self { bar }
    }
}

impl ScrapeProgress for CliScrapeProgress {
    fn page_done(&self, url: &str, ok: bool, current: usize, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(current as u64);
        self.bar.set_message(url.to_string());
        if !ok {
            self.bar.println(format!("  ✗ {url}"));
        }
    }
}

async fn cmd_scrape(config: AppConfig, links: &Path, out: Option<&Path>) -> Result<()> {
    let out = out
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&config.data.corpus_path));

    info!(links = %links.display(), out = %out.display(), "scraping link table");

    let scraper = Scraper::new(config.scrape)?;
    let progress = CliScrapeProgress::new();
    let report = scraper.export_corpus(links, &out, &progress).await?;
    progress.bar.finish_and_clear();

    println!();
    println!("  Corpus written to {}", out.display());
    println!("  Fetched: {}", report.pages_fetched);
    println!("  Failed:  {}", report.pages_failed);
    println!("  Time:    {:.1}s", report.duration.as_secs_f64());
    println!();

    Ok(())
}

// ---------------------------------------------------------------------------
// products
// ---------------------------------------------------------------------------

fn cmd_products(
    config: &AppConfig,
    keyword: Option<&str>,
    center: Option<&str>,
    export: Option<&Path>,
    list_centers: bool,
) -> Result<()> {
    let rows = siteqa_storage::load_catalog(Path::new(&config.data.catalog_path))?;
    let catalog = Catalog::new(rows);

    if list_centers {
        for center in catalog.centers() {
            println!("{center}");
        }
        return Ok(());
    }

    let matches = catalog.filter(keyword.unwrap_or(""), center.unwrap_or(ALL_CENTERS));
    info!(total = catalog.len(), matched = matches.len(), "catalog filtered");

    let owned: Vec<CatalogRow> = matches.iter().map(|row| (*row).clone()).collect();
    match catalog_table(&owned) {
        Some(table) => println!("{table}"),
        None => println!("ไม่พบสินค้า/บริการที่ตรงกับเงื่อนไข"),
    }

    if let Some(path) = export {
        let count = siteqa_storage::export_catalog_csv(path, &owned)?;
        println!("\nExported {count} rows to {}", path.display());
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

fn cmd_config_init(path: Option<&Path>) -> Result<()> {
    let path = match path {
        Some(path) => {
            init_config_at(path)?;
            path.to_path_buf()
        }
        None => init_config()?,
    };
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(path: Option<&Path>) -> Result<()> {
    let source = match path {
        Some(path) => path.to_path_buf(),
        None => config_file_path()?,
    };
    let config = resolve_config(path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("# {}", source.display());
    println!("{toml_str}");
    Ok(())
}
