// src/fetch/http.rs
// =============================================================================
// The reqwest-backed page fetcher.
//
// Key functionality:
// - One shared Client for all workers (connection pooling)
// - Sends the configured User-Agent header
// - Optionally skips TLS certificate validation (--insecure)
// - Non-2xx answers count as failures, like network errors do
// - Bodies are read chunk by chunk and abandoned past max_body_bytes
//
// Rust concepts:
// - Traits: HttpFetcher implements PageFetcher
// - async blocks: the trait method returns a future we build with async move
// =============================================================================

use super::{FetchError, FetchOptions, PageFetcher};
use anyhow::{Context, Result};
use reqwest::Client;
use std::future::Future;

pub struct HttpFetcher {
    client: Client,
    max_body_bytes: usize,
}

impl HttpFetcher {
    // Builds the shared HTTP client
    //
    // Fails only if the TLS backend cannot be initialised
    pub fn new(options: &FetchOptions) -> Result<Self> {
        let client = Client::builder()
            .timeout(options.timeout)
            .user_agent(options.user_agent.as_str())
            .danger_accept_invalid_certs(options.skip_certificate_validation)
            .build()
            .context("failed to create HTTP client")?;

        Ok(Self {
            client,
            max_body_bytes: options.max_body_bytes,
        })
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, FetchError>> + Send {
        let request = self.client.get(url);
        let limit = self.max_body_bytes;
        let url = url.to_string();

        async move {
            let mut response = request
                .send()
                .await
                .map_err(|e| categorize_error(&url, e))?;

            if !response.status().is_success() {
                return Err(FetchError::Status {
                    url,
                    status: response.status().as_u16(),
                });
            }

            // Trust the announced length when there is one
            if response
                .content_length()
                .is_some_and(|length| length > limit as u64)
            {
                return Err(FetchError::TooLarge { url, limit });
            }

            let mut body = Vec::new();
            while let Some(chunk) = response
                .chunk()
                .await
                .map_err(|e| categorize_error(&url, e))?
            {
                if body.len() + chunk.len() > limit {
                    return Err(FetchError::TooLarge { url, limit });
                }
                body.extend_from_slice(&chunk);
            }

            Ok(String::from_utf8_lossy(&body).into_owned())
        }
    }
}

// Sorts reqwest errors into the kinds we log differently
fn categorize_error(url: &str, error: reqwest::Error) -> FetchError {
    let url = url.to_string();

    if error.is_timeout() {
        FetchError::Timeout { url }
    } else if error.is_connect() {
        FetchError::Connect {
            url,
            reason: error.to_string(),
        }
    } else {
        FetchError::Transport { url, source: error }
    }
}
