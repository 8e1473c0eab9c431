//! kwcrawl main entry point
//!
//! This is the command-line interface for the kwcrawl keyword crawler.

use clap::Parser;
use kwcrawl::config::{load_config_with_hash, validate, Config};
use kwcrawl::crawler::run_crawl;
use kwcrawl::output::print_summary;
use kwcrawl::CrawlError;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// kwcrawl: a concurrent breadth-first keyword crawler
///
/// Crawls outward from SEED_URI, fetching every reachable absolute link once,
/// and appends one {"webpage":{"uri":..,"keywords":[..]}} record per page to
/// the output file.
#[derive(Parser, Debug)]
#[command(name = "kwcrawl")]
#[command(version)]
#[command(about = "A concurrent breadth-first keyword crawler", long_about = None)]
struct Cli {
    /// Absolute http(s) URI to start crawling from
    #[arg(value_name = "SEED_URI")]
    seed: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Record log to append to (default: output.txt)
    #[arg(short, long, value_name = "PATH")]
    output: Option<String>,

    /// Number of concurrent workers
    #[arg(short, long)]
    workers: Option<u32>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECONDS")]
    timeout: Option<u64>,

    /// Extra attempts for timeouts, connection failures and 5xx responses
    #[arg(long)]
    retries: Option<u32>,

    /// Accept invalid TLS certificates (dangerous)
    #[arg(long)]
    insecure: bool,

    /// Abort the whole crawl if a record cannot be written
    #[arg(long)]
    abort_on_write_error: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match load_settings(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    match run_crawl(config, &cli.seed).await {
        Ok(summary) => {
            if !cli.quiet {
                print_summary(&summary);
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("kwcrawl=info,warn"),
            1 => EnvFilter::new("kwcrawl=debug,info"),
            2 => EnvFilter::new("kwcrawl=trace,debug"),
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

/// Loads the optional config file and applies command-line overrides
fn load_settings(cli: &Cli) -> Result<Config, CrawlError> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if let Some(output) = &cli.output {
        config.output.path = output.clone();
    }
    if let Some(workers) = cli.workers {
        config.crawler.workers = workers;
    }
    if let Some(timeout) = cli.timeout {
        config.crawler.request_timeout = timeout;
    }
    if let Some(retries) = cli.retries {
        config.crawler.max_retries = retries;
    }
    if cli.insecure {
        config.crawler.accept_invalid_certs = true;
    }
    if cli.abort_on_write_error {
        config.output.abort_on_write_error = true;
    }

    validate(&config)?;
    Ok(config)
}
