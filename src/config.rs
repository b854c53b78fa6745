// src/config.rs
// =============================================================================
// The validated settings of one crawl run.
//
// The CLI gives us raw values; this module checks them once, up front, so the
// crawl engine never has to deal with a zero-sized pool or a seed that is not
// a URL.
// =============================================================================

use crate::cli::Cli;
use crate::fetch::FetchOptions;
use anyhow::{anyhow, bail, Result};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlConfig {
    pub seed: String,
    pub crawl_workers: usize,
    pub report_writers: usize,
    pub fetch: FetchOptions,
    /// None means stdout
    pub output: Option<PathBuf>,
    pub deadline: Option<Duration>,
    pub json_summary: bool,
}

impl CrawlConfig {
    // `seed` is the URL from the command line or from the prompt
    pub fn from_cli(cli: &Cli, seed: String) -> Result<Self> {
        let seed = seed.trim().to_string();
        if seed.is_empty() {
            bail!("No URL to crawl");
        }

        // The seed itself is crawled as given; parsing only rejects garbage
        Url::parse(&seed).map_err(|e| anyhow!("Invalid URL '{}': {}", seed, e))?;

        if cli.crawlers == 0 {
            bail!("--crawlers must be at least 1");
        }
        if cli.writers == 0 {
            bail!("--writers must be at least 1");
        }
        if cli.timeout == 0 {
            bail!("--timeout must be at least 1 second");
        }

        Ok(Self {
            seed,
            crawl_workers: cli.crawlers,
            report_writers: cli.writers,
            fetch: FetchOptions {
                user_agent: cli.user_agent.clone(),
                timeout: Duration::from_secs(cli.timeout),
                skip_certificate_validation: cli.insecure,
                max_body_bytes: cli.max_page_bytes,
            },
            output: cli.output.clone(),
            deadline: cli.deadline.map(Duration::from_secs),
            json_summary: cli.json_summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("web-crawler").chain(args.iter().copied()))
    }

    #[test]
    fn test_valid_config() {
        let cli = cli(&["--insecure", "--timeout", "5", "--deadline", "60"]);
        let config = CrawlConfig::from_cli(&cli, " https://example.com \n".to_string()).unwrap();

        assert_eq!(config.seed, "https://example.com");
        assert_eq!(config.crawl_workers, 10);
        assert_eq!(config.fetch.timeout, Duration::from_secs(5));
        assert!(config.fetch.skip_certificate_validation);
        assert_eq!(config.fetch.max_body_bytes, 10 * 1024 * 1024);
        assert_eq!(config.deadline, Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_rejects_empty_seed() {
        assert!(CrawlConfig::from_cli(&cli(&[]), "   ".to_string()).is_err());
    }

    #[test]
    fn test_rejects_unparseable_seed() {
        assert!(CrawlConfig::from_cli(&cli(&[]), "not a url".to_string()).is_err());
    }

    #[test]
    fn test_rejects_empty_pools() {
        let seed = "https://example.com".to_string();
        assert!(CrawlConfig::from_cli(&cli(&["--crawlers", "0"]), seed.clone()).is_err());
        assert!(CrawlConfig::from_cli(&cli(&["--writers", "0"]), seed).is_err());
    }
}
