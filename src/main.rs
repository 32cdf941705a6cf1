//! Lead-Harvest main entry point
//!
//! This is the command-line interface for the Lead-Harvest crawler.

use anyhow::{bail, Context};
use clap::Parser;
use lead_harvest::browser::HttpLauncher;
use lead_harvest::config::{load_config_with_hash, Config};
use lead_harvest::crawler::{crawl, Coordinator, CrawlRequest};
use lead_harvest::output::{print_summary, write_leads_jsonl, LogProgressSink};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Lead-Harvest: a paced lead crawler
///
/// Lead-Harvest walks the paginated results of a signed-in search page,
/// extracts one contact record per result row and adapts its request pace
/// to how the site responds.
#[derive(Parser, Debug)]
#[command(name = "lead-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A paced lead crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Search result URL to crawl
    #[arg(long, required_unless_present_any = ["probe", "dry_run"])]
    url: Option<String>,

    /// Maximum number of leads to collect
    #[arg(long, default_value_t = 1000)]
    max_results: u32,

    /// Base delay between pages in seconds (clamped to the configured bounds)
    #[arg(long)]
    delay_secs: Option<u64>,

    /// File holding session cookies (JSON export or `name=value; ...`)
    #[arg(long, value_name = "PATH")]
    cookies_file: Option<PathBuf>,

    /// Write harvested leads here as JSON lines
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Only check whether the cookies yield a signed-in session
    #[arg(long, conflicts_with = "dry_run")]
    probe: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "probe")]
    dry_run: bool,

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

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    let credentials = match &cli.cookies_file {
        Some(path) => Some(read_credentials(path)?),
        None => None,
    };

    if cli.dry_run {
        handle_dry_run(&config, &cli);
        Ok(())
    } else if cli.probe {
        handle_probe(config, credentials.as_deref()).await
    } else {
        handle_crawl(config, &cli, credentials).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("lead_harvest=info,warn"),
            1 => EnvFilter::new("lead_harvest=debug,info"),
            2 => EnvFilter::new("lead_harvest=trace,debug"),
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

fn read_credentials(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read cookies file {}", path.display()))
}

/// Handles the --dry-run mode: shows the effective settings without crawling
fn handle_dry_run(config: &Config, cli: &Cli) {
    println!("=== Lead-Harvest Dry Run ===\n");

    println!("Pacing:");
    println!(
        "  Delay bounds: {}ms - {}ms (default {}ms)",
        config.pacing.min_delay_ms, config.pacing.max_delay_ms, config.pacing.default_delay_ms
    );
    println!(
        "  Row jitter: {}ms - {}ms",
        config.pacing.row_jitter_min_ms, config.pacing.row_jitter_max_ms
    );
    match config.pacing.seed {
        Some(seed) => println!("  Seed: {}", seed),
        None => println!("  Seed: random"),
    }

    println!("\nTimeouts:");
    println!("  Page load: {}ms", config.timeouts.page_load_ms);
    println!("  Settle: {}ms", config.timeouts.settle_ms);
    println!("  Rows appear: {}ms", config.timeouts.rows_appear_ms);

    println!("\nCrawler:");
    println!("  Base URL: {}", config.crawler.base_url);
    println!("  Cookie domain: {}", config.crawler.cookie_domain);
    println!("  Max pages: {}", config.crawler.max_pages);
    println!(
        "  Total estimate multiplier: {}",
        config.crawler.total_estimate_multiplier
    );

    println!("\nSelectors:");
    println!("  Rows: {}", config.selectors.rows.join(" | "));
    println!("  Next page: {}", config.selectors.next_page.join(" | "));

    println!("\n✓ Configuration is valid");
    if let Some(url) = &cli.url {
        println!(
            "✓ Would collect up to {} leads from {}",
            cli.max_results, url
        );
    }
}

/// Handles the --probe mode: reports whether the session is signed in
async fn handle_probe(config: Config, credentials: Option<&str>) -> anyhow::Result<()> {
    let launcher = HttpLauncher::new(config.http.clone(), &config.timeouts);
    let probe = Coordinator::new(config, launcher).probe(credentials).await;

    if probe.authenticated {
        println!("✓ {}", probe.message);
        Ok(())
    } else {
        bail!("{}", probe.message)
    }
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: Config,
    cli: &Cli,
    credentials: Option<String>,
) -> anyhow::Result<()> {
    let Some(url) = cli.url.clone() else {
        bail!("--url is required to crawl");
    };

    let mut request = CrawlRequest::new(url, cli.max_results);
    request.credentials = credentials;
    if let Some(seconds) = cli.delay_secs {
        request = request.with_base_delay_secs(seconds);
    }

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping at the next page boundary");
            trigger.cancel();
        }
    });

    // Run the crawler
    let outcome = crawl(config, request, &LogProgressSink, cancel).await?;
    print_summary(&outcome);

    if let Some(path) = &cli.output {
        write_leads_jsonl(&outcome.leads, path)
            .with_context(|| format!("Failed to write leads to {}", path.display()))?;
        println!("✓ Leads written to: {}", path.display());
    }

    match outcome.status.failure() {
        Some(reason) => bail!("Crawl failed: {}", reason),
        None => Ok(()),
    }
}
