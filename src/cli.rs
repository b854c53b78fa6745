// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use the "derive" API: the CLI is a plain struct and clap generates the
// parsing, --help and --version from its fields and attributes.
//
// Rust concepts:
// - Structs: Custom data types that group related data
// - Option<T>: arguments the user may leave out
// - Derive macros: Automatically generate code for our types
// =============================================================================

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

// This struct represents our entire CLI application
#[derive(Parser, Debug)]
#[command(
    name = "web-crawler",
    version = "0.1.0",
    about = "Crawl the web breadth-first from one URL and print every page and its links",
    long_about = "web-crawler starts at one URL and follows every absolute link it finds, \
                  with a pool of parallel crawl workers. Each visited page is printed on its own \
                  line, followed by the new links found on it (indented with a tab)."
)]
pub struct Cli {
    /// Website to start crawling from (e.g., https://example.com)
    ///
    /// If left out, you are asked for it on the terminal
    pub url: Option<String>,

    /// Number of crawl workers (pages fetched in parallel)
    #[arg(short = 'c', long, default_value_t = 10)]
    pub crawlers: usize,

    /// Number of report writers
    #[arg(short = 'w', long, default_value_t = 10)]
    pub writers: usize,

    /// Accept invalid TLS certificates
    #[arg(long)]
    pub insecure: bool,

    /// User-Agent header sent with every request
    #[arg(long, default_value = "Mozilla/5.0")]
    pub user_agent: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout: u64,

    /// Skip pages whose body is bigger than this many bytes
    #[arg(long, default_value_t = 10 * 1024 * 1024)]
    pub max_page_bytes: usize,

    /// Write the report to this file instead of stdout
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Stop the whole crawl after this many seconds
    #[arg(long)]
    pub deadline: Option<u64>,

    /// Print a JSON summary of the crawl when it ends
    #[arg(long)]
    pub json_summary: bool,

    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

// Asks for the seed URL on stdin, the way the crawler works without arguments
//
// The prompt goes to stderr: stdout carries the report
pub fn prompt_for_url() -> Result<String> {
    read_url(io::stdin().lock(), io::stderr())
}

fn read_url(mut input: impl BufRead, mut prompt: impl Write) -> Result<String> {
    write!(prompt, "Please Enter Website to Crawl > ").context("failed to write prompt")?;
    prompt.flush().context("failed to write prompt")?;

    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("failed to read URL from stdin")?;

    Ok(line.trim().to_string())
}
