// src/fetch/mod.rs
// =============================================================================
// This module turns a URL into the text of a page.
//
// Submodules:
// - http: the real fetcher, built on reqwest
//
// The crawl workers only know the PageFetcher trait. That keeps the network
// out of the crawl engine's tests: they plug in an in-memory fetcher instead.
// =============================================================================

mod http;

use std::future::Future;
use std::time::Duration;

pub use http::HttpFetcher;

/// Everything that can go wrong while fetching one page.
///
/// None of these stop a crawl: the worker logs the error and moves on.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The server answered, but not with a 2xx status
    #[error("{url}: HTTP {status}")]
    Status { url: String, status: u16 },

    /// The request did not finish within the configured timeout
    #[error("{url}: request timed out")]
    Timeout { url: String },

    /// Could not connect (DNS failure, refused connection, TLS handshake)
    #[error("{url}: connection failed: {reason}")]
    Connect { url: String, reason: String },

    /// The body is bigger than the configured limit
    #[error("{url}: page larger than {limit} bytes")]
    TooLarge { url: String, limit: usize },

    /// Any other transport failure, including reading the body
    #[error("{url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    pub fn url(&self) -> &str {
        match self {
            FetchError::Status { url, .. }
            | FetchError::Timeout { url }
            | FetchError::Connect { url, .. }
            | FetchError::TooLarge { url, .. }
            | FetchError::Transport { url, .. } => url,
        }
    }
}

// How requests are made
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    /// Sent as the User-Agent header on every request
    pub user_agent: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Accept invalid or self-signed TLS certificates
    pub skip_certificate_validation: bool,
    /// Pages with a bigger body are dropped without reading the rest
    pub max_body_bytes: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0".to_string(),
            timeout: Duration::from_secs(10),
            skip_certificate_validation: false,
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Fetches the document behind a URL.
///
/// Implementations are shared by every crawl worker, hence `Send + Sync`.
pub trait PageFetcher: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, FetchError>> + Send;
}
