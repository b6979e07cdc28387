//! Crawl-Sentinel main entry point
//!
//! This is the command-line interface for running spiders and inspecting
//! the error log they produce.

use anyhow::Context;
use clap::{Parser, Subcommand};
use crawl_sentinel::config::{load_config_with_hash, Config};
use crawl_sentinel::crawler::{run_spider, SpiderRegistry};
use crawl_sentinel::logstore::open_error_sink;
use crawl_sentinel::output::{load_statistics, print_run_report, print_statistics};
use crawl_sentinel::SentinelError;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Crawl-Sentinel: crawl jobs with classified, durable error logs
///
/// Every failure a spider hits is classified into a stable
/// (category, subcategory, code) triple and appended to the error log.
/// Lifecycle events go to a separate signal log.
#[derive(Parser, Debug)]
#[command(name = "crawl-sentinel")]
#[command(version)]
#[command(about = "Crawl jobs with classified, durable error logs", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a spider
    Run {
        /// Name of the spider to run
        spider: String,

        /// Start URLs replacing the spider's own
        urls: Vec<String>,
    },

    /// Show statistics from the error log and exit
    Summary,

    /// Write the error log as a single JSON array
    Export {
        /// Destination file
        path: PathBuf,
    },

    /// List configured spiders
    List,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = load(cli.config.as_deref())?;

    match cli.command {
        Command::Run { spider, urls } => handle_run(config, &spider, &urls).await,
        Command::Summary => handle_summary(&config).map(|_| ExitCode::SUCCESS),
        Command::Export { path } => handle_export(&config, &path).map(|_| ExitCode::SUCCESS),
        Command::List => {
            handle_list(&config);
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("crawl_sentinel=info,warn"),
            1 => EnvFilter::new("crawl_sentinel=debug,info"),
            2 => EnvFilter::new("crawl_sentinel=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads and validates the configuration, or falls back to defaults
fn load(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        tracing::info!("No configuration file given, using defaults");
        return Ok(Config::default());
    };

    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    Ok(config)
}

/// Handles the `run` command
async fn handle_run(config: Config, spider: &str, urls: &[String]) -> anyhow::Result<ExitCode> {
    tracing::info!("Starting spider {}", spider);

    match run_spider(config, spider, urls).await {
        Ok(report) => {
            print_run_report(&report);
            Ok(ExitCode::SUCCESS)
        }
        Err(SentinelError::SpiderNotFound(name)) => {
            println!("❌ ERROR: Spider not found: {}", name);
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e).context("Crawl failed"),
    }
}

/// Handles the `summary` command: shows statistics from the error log
fn handle_summary(config: &Config) -> anyhow::Result<()> {
    println!("Error log: {}\n", config.logging.error_log);

    let sink = open_error_sink(&config.logging).context("Failed to open error log")?;
    let stats = load_statistics(sink.as_ref())?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the `export` command: writes the JSON array view of the error log
fn handle_export(config: &Config, path: &Path) -> anyhow::Result<()> {
    let sink = open_error_sink(&config.logging).context("Failed to open error log")?;
    let written = sink
        .export_json_array(path)
        .with_context(|| format!("Failed to export to {}", path.display()))?;

    println!("✓ Exported {} entries to: {}", written, path.display());
    Ok(())
}

/// Handles the `list` command
fn handle_list(config: &Config) {
    let registry = SpiderRegistry::from_config(config);
    println!("Spiders ({}):", registry.names().len());
    for name in registry.names() {
        println!("  - {}", name);
    }
}
