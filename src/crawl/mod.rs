// src/crawl/mod.rs
// =============================================================================
// This module is the crawl engine.
//
// Pieces:
// - queue: the shutdown-aware FIFO used as frontier and output channel
// - registry: the visited registry (atomic claims)
// - worker: the crawl worker loop
// - coordinator: starts both pools, detects quiescence, shuts them down
//
// Features:
// - Parallel, approximately breadth-first crawling from one seed URL
// - Every URL is claimed once and fetched at most once
// - Report output is decoupled from crawling through its own queue
// =============================================================================

mod coordinator;
mod queue;
mod registry;
mod worker;

pub use coordinator::{Crawl, CrawlSummary};
pub use queue::{Message, WorkQueue};
pub use registry::{Claim, VisitedRegistry};
pub use worker::{CrawlWorker, WorkerTally};

/// URLs waiting to be crawled. Each one was claimed before it was pushed.
pub type Frontier = WorkQueue<Claim>;

// An in-memory link graph standing in for the network in tests
#[cfg(test)]
pub(crate) mod testing {
    use crate::fetch::{FetchError, PageFetcher};
    use std::collections::{HashMap, HashSet};
    use std::future::Future;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Default)]
    struct Graph {
        pages: HashMap<String, String>,
        failing: HashSet<String>,
        panicking: HashSet<String>,
        delay: Option<Duration>,
        fetched: Mutex<Vec<String>>,
    }

    #[derive(Clone, Default)]
    pub(crate) struct GraphFetcher {
        graph: Arc<Graph>,
    }

    impl GraphFetcher {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        fn graph_mut(&mut self) -> &mut Graph {
            Arc::get_mut(&mut self.graph).expect("configure the graph before sharing it")
        }

        // Adds a page whose body links to `links`
        pub(crate) fn page(mut self, url: &str, links: &[&str]) -> Self {
            let body: String = links
                .iter()
                .map(|link| format!(r#"<a href="{}">link</a>"#, link))
                .collect();
            self.graph_mut()
                .pages
                .insert(url.to_string(), format!("<html><body>{}</body></html>", body));
            self
        }

        // Makes fetching `url` fail with a connection error
        pub(crate) fn failing(mut self, url: &str) -> Self {
            self.graph_mut().failing.insert(url.to_string());
            self
        }

        // Makes fetching `url` panic
        pub(crate) fn panicking(mut self, url: &str) -> Self {
            self.graph_mut().panicking.insert(url.to_string());
            self
        }

        // Every fetch sleeps this long first, so workers overlap
        pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
            self.graph_mut().delay = Some(delay);
            self
        }

        pub(crate) fn fetch_count(&self, url: &str) -> usize {
            self.graph
                .fetched
                .lock()
                .unwrap()
                .iter()
                .filter(|fetched| fetched.as_str() == url)
                .count()
        }

        pub(crate) fn total_fetches(&self) -> usize {
            self.graph.fetched.lock().unwrap().len()
        }
    }

    impl PageFetcher for GraphFetcher {
        fn fetch(&self, url: &str) -> impl Future<Output = Result<String, FetchError>> + Send {
            let graph = Arc::clone(&self.graph);
            let url = url.to_string();

            async move {
                graph.fetched.lock().unwrap().push(url.clone());
                if let Some(delay) = graph.delay {
                    tokio::time::sleep(delay).await;
                }

                if graph.panicking.contains(&url) {
                    panic!("fetcher blew up on {}", url);
                }
                if graph.failing.contains(&url) {
                    return Err(FetchError::Connect {
                        url,
                        reason: "connection refused".to_string(),
                    });
                }
                match graph.pages.get(&url) {
                    Some(body) => Ok(body.clone()),
                    None => Err(FetchError::Status { url, status: 404 }),
                }
            }
        }
    }
}
