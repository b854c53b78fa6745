// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap (or prompt for the URL)
// 2. Set up logging on stderr
// 3. Build the HTTP fetcher and the report sink
// 4. Run the crawl until there is no work left anywhere
// 5. Exit with proper code (0 = crawl finished, 2 = error)
//
// The report goes to stdout (or --output); logs go to stderr, so the two
// never mix.
// =============================================================================

mod cli;
mod config;
mod crawl;
mod fetch;
mod links;
mod report;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use config::CrawlConfig;
use crawl::{Crawl, CrawlSummary};
use fetch::HttpFetcher;
use report::ReportSink;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(_) => 0,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<CrawlSummary> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let seed = match &cli.url {
        Some(url) => url.clone(),
        None => cli::prompt_for_url()?,
    };
    let config = CrawlConfig::from_cli(&cli, seed)?;

    let fetcher = HttpFetcher::new(&config.fetch)?;
    let sink = match &config.output {
        Some(path) => ReportSink::file(path)?,
        None => ReportSink::stdout(),
    };

    let summary = Crawl::new(fetcher, sink)
        .crawl_workers(config.crawl_workers)
        .report_writers(config.report_writers)
        .deadline(config.deadline)
        .run(&config.seed)
        .await?;

    if config.json_summary {
        eprintln!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        info!(
            visited = summary.pages_visited,
            failed = summary.fetch_failures,
            discovered = summary.links_discovered,
            elapsed_ms = summary.elapsed_ms as u64,
            timed_out = summary.timed_out,
            "crawl summary"
        );
    }

    Ok(summary)
}

// RUST_LOG wins when set; otherwise -v flags pick the level
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
