//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use founderwiki_core::batch::{BatchConfig, BatchSummary, ProgressReporter};
use founderwiki_core::export::ExportConfig;
use founderwiki_core::llm::OpenRouterClient;
use founderwiki_core::lookup::LookupPipeline;
use founderwiki_shared::{AppConfig, init_config, load_config, validate_api_key};
use founderwiki_store::ResultStore;
use founderwiki_wiki::WikipediaClient;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// FounderWiki — enrich founder datasets with Wikipedia career data.
#[derive(Parser)]
#[command(
    name = "founderwiki",
    version,
    about = "Enrich a founder CSV with Wikipedia career data and export it as a flat table.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

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
    /// Run the enrichment batch over the input founder CSV. Resumes where the
    /// previous run stopped.
    Enrich {
        /// Input founder CSV (defaults to the configured path).
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Result store JSON (defaults to the configured path).
        #[arg(long)]
        results: Option<PathBuf>,

        /// Batch tracker JSON (defaults to the configured path).
        #[arg(long)]
        tracker: Option<PathBuf>,
    },

    /// Export the result store to a flat CSV. Resumes an interrupted export.
    Export {
        /// Result store JSON (defaults to the configured path).
        #[arg(long)]
        results: Option<PathBuf>,

        /// Export tracker JSON (defaults to the configured path).
        #[arg(long)]
        tracker: Option<PathBuf>,

        /// Output CSV path (defaults to the configured path).
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
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

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "founderwiki=info",
        1 => "founderwiki=debug",
        _ => "founderwiki=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Enrich {
            input,
            results,
            tracker,
        } => cmd_enrich(input, results, tracker).await,
        Command::Export {
            results,
            tracker,
            out,
        } => cmd_export(results, tracker, out).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

async fn cmd_enrich(
    input: Option<PathBuf>,
    results: Option<PathBuf>,
    tracker: Option<PathBuf>,
) -> Result<()> {
    // Validate API key before doing anything
    let config = load_config()?;
    validate_api_key(&config)?;

    let batch_config = BatchConfig {
        input_csv: input.unwrap_or_else(|| PathBuf::from(&config.paths.input_csv)),
        result_store: results.unwrap_or_else(|| PathBuf::from(&config.paths.result_store)),
        tracker: tracker.unwrap_or_else(|| PathBuf::from(&config.paths.tracker)),
    };

    info!(
        input = %batch_config.input_csv.display(),
        model = %config.openrouter.model,
        "starting enrichment batch"
    );

    let wiki = WikipediaClient::new(&config.wikipedia)?;
    let chat = OpenRouterClient::new(&config.openrouter)?;
    let pipeline = LookupPipeline::new(Arc::new(wiki), Arc::new(chat), config.override_map());

    let reporter = CliProgress::new();
    let summary = founderwiki_core::batch::run(&pipeline, &batch_config, &reporter).await?;

    let store = ResultStore::load(&batch_config.result_store)?;

    println!();
    println!("  Enrichment batch finished!");
    println!("  Processed: {}", summary.processed);
    println!("  Skipped:   {}", summary.skipped);
    println!("  Matched:   {}", summary.matched);
    println!("  Rejected:  {}", summary.rejected);
    println!("  Failed:    {}", summary.failed);
    println!("  Store:     {} records ({})", store.len(), store.path().display());
    println!();

    Ok(())
}

async fn cmd_export(
    results: Option<PathBuf>,
    tracker: Option<PathBuf>,
    out: Option<PathBuf>,
) -> Result<()> {
    let config = load_config()?;

    let export_config = ExportConfig {
        result_store: results.unwrap_or_else(|| PathBuf::from(&config.paths.result_store)),
        tracker: tracker.unwrap_or_else(|| PathBuf::from(&config.paths.export_tracker)),
        output_csv: out.unwrap_or_else(|| PathBuf::from(&config.paths.output_csv)),
    };

    info!(
        store = %export_config.result_store.display(),
        out = %export_config.output_csv.display(),
        "exporting result store"
    );

    let summary = founderwiki_core::export::export(&export_config)?;

    println!();
    if summary.resumed {
        println!("  Export resumed and completed!");
    } else {
        println!("  Export completed!");
    }
    println!("  Rows written:    {}", summary.written);
    println!("  Total rows:      {}", summary.total_processed);
    println!("  Experience cols: {} slots", summary.max_experiences);
    println!("  Output CSV:      {}", export_config.output_csv.display());
    println!();

    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn begin(&self, total: usize) {
        self.spinner.set_message(format!("Processing {total} founders"));
    }

    fn item(&self, index: usize, total: usize, name: &str) {
        self.spinner
            .set_message(format!("Looking up [{}/{total}] {name}", index + 1));
    }

    fn finish(&self, _summary: &BatchSummary) {
        self.spinner.finish_and_clear();
    }
}
