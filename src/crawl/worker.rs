// src/crawl/worker.rs
// =============================================================================
// A crawl worker: the fetch → parse → extract → enqueue loop.
//
// How it works:
// 1. Pop a claimed URL from the frontier (this also takes an in-flight lease)
// 2. Fetch the page; on failure log it and go back to step 1
// 3. Report the page as visited
// 4. For every followable link on the page, try to claim it
// 5. Each link we win goes onto the frontier and into the report
// 6. Drop the lease, go back to step 1
//
// The loop ends only when the frontier hands us a shutdown signal.
//
// Rust concepts:
// - Arc: the frontier, registry, output channel and fetcher are shared
// - Generics: the worker is generic over the PageFetcher it uses
// =============================================================================

use super::{Frontier, Message, VisitedRegistry};
use crate::fetch::PageFetcher;
use crate::links::extract_followable;
use crate::report::{OutputChannel, ReportRecord};
use futures::FutureExt;
use serde::Serialize;
use std::any::Any;
use std::ops::AddAssign;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, trace, warn};

// What one worker did during the run, returned when it stops
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WorkerTally {
    pub pages_visited: usize,
    pub fetch_failures: usize,
    pub links_discovered: usize,
}

impl AddAssign for WorkerTally {
    fn add_assign(&mut self, other: Self) {
        self.pages_visited += other.pages_visited;
        self.fetch_failures += other.fetch_failures;
        self.links_discovered += other.links_discovered;
    }
}

pub struct CrawlWorker<F> {
    id: usize,
    frontier: Arc<Frontier>,
    registry: Arc<VisitedRegistry>,
    output: Arc<OutputChannel>,
    fetcher: Arc<F>,
}

impl<F: PageFetcher> CrawlWorker<F> {
    pub fn new(
        id: usize,
        frontier: Arc<Frontier>,
        registry: Arc<VisitedRegistry>,
        output: Arc<OutputChannel>,
        fetcher: Arc<F>,
    ) -> Self {
        Self {
            id,
            frontier,
            registry,
            output,
            fetcher,
        }
    }

    pub async fn run(self) -> WorkerTally {
        let mut tally = WorkerTally::default();

        loop {
            let (claim, lease) = match self.frontier.pop_leased().await {
                Message::Item(work) => work,
                Message::Shutdown => break,
            };

            // A panic while fetching or parsing one page costs that page only
            let page = AssertUnwindSafe(self.crawl_page(claim.url(), &mut tally));
            if let Err(panic) = page.catch_unwind().await {
                warn!(
                    worker = self.id,
                    url = claim.url(),
                    "page handling panicked: {}",
                    panic_message(panic.as_ref())
                );
                tally.fetch_failures += 1;
            }

            // Every push caused by this page has been made
            drop(lease);
        }

        debug!(worker = self.id, ?tally, "The crawl has finished");
        tally
    }

    async fn crawl_page(&self, url: &str, tally: &mut WorkerTally) {
        let html = match self.fetcher.fetch(url).await {
            Ok(html) => html,
            Err(e) => {
                // The claim stays: this URL is never tried again
                debug!(worker = self.id, url = e.url(), "skipping page: {}", e);
                tally.fetch_failures += 1;
                return;
            }
        };

        self.output.push(ReportRecord::Visited(url.to_string()));
        tally.pages_visited += 1;

        let links = extract_followable(&html);
        for link in links.iter() {
            let Some(claim) = self.registry.claim(link) else {
                continue;
            };
            trace!(worker = self.id, from = url, link, "discovered");
            self.output.push(ReportRecord::Discovered(link.to_string()));
            self.frontier.push(claim);
            tally.links_discovered += 1;
        }
    }
}

// Panic payloads are usually a &str or a String
fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawl::testing::GraphFetcher;
    use std::time::Duration;

    struct Harness {
        frontier: Arc<Frontier>,
        registry: Arc<VisitedRegistry>,
        output: Arc<OutputChannel>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                frontier: Arc::new(Frontier::new()),
                registry: Arc::new(VisitedRegistry::new()),
                output: Arc::new(OutputChannel::new()),
            }
        }

        fn seed(&self, url: &str) {
            let claim = self.registry.claim(url).unwrap();
            self.frontier.push(claim);
        }

        // Runs one worker until the frontier is drained, then stops it
        async fn run_one(&self, fetcher: GraphFetcher) -> WorkerTally {
            let worker = CrawlWorker::new(
                0,
                Arc::clone(&self.frontier),
                Arc::clone(&self.registry),
                Arc::clone(&self.output),
                Arc::new(fetcher),
            );
            let handle = tokio::spawn(worker.run());
            tokio::time::timeout(Duration::from_secs(5), self.frontier.wait_quiescent())
                .await
                .unwrap();
            self.frontier.close_for_worker();
            handle.await.unwrap()
        }

        async fn records(&self) -> Vec<ReportRecord> {
            let mut records = Vec::new();
            self.output.close_for_worker();
            while let Message::Item(record) = self.output.pop().await {
                records.push(record);
            }
            records
        }
    }

    #[tokio::test]
    async fn test_visited_line_precedes_its_links() {
        let harness = Harness::new();
        harness.seed("http://a.test");
        let fetcher = GraphFetcher::new()
            .page("http://a.test", &["http://b.test", "http://a.test", "relative/x"])
            .page("http://b.test", &[]);

        let tally = harness.run_one(fetcher).await;

        assert_eq!(
            harness.records().await,
            vec![
                ReportRecord::Visited("http://a.test".to_string()),
                ReportRecord::Discovered("http://b.test".to_string()),
                ReportRecord::Visited("http://b.test".to_string()),
            ]
        );
        assert_eq!(tally.pages_visited, 2);
        assert_eq!(tally.links_discovered, 1);
    }

    #[tokio::test]
    async fn test_refeeding_known_page_pushes_nothing() {
        let harness = Harness::new();
        harness.seed("http://a.test");
        let fetcher = GraphFetcher::new()
            .page("http://a.test", &["http://b.test"])
            .page("http://b.test", &["http://a.test"]);
        harness.run_one(fetcher.clone()).await;
        harness.records().await;

        // Hand the same page to a fresh worker pass. Its links are all claimed.
        let refeed = Arc::new(Frontier::new());
        let worker = CrawlWorker::new(
            1,
            Arc::clone(&refeed),
            Arc::clone(&harness.registry),
            Arc::new(OutputChannel::new()),
            Arc::new(fetcher),
        );
        let mut tally = WorkerTally::default();
        worker.crawl_page("http://a.test", &mut tally).await;

        assert_eq!(tally.pages_visited, 1);
        assert_eq!(tally.links_discovered, 0);
        assert!(refeed.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_reports_nothing() {
        let harness = Harness::new();
        harness.seed("http://d.test");
        let fetcher = GraphFetcher::new().failing("http://d.test");

        let tally = harness.run_one(fetcher.clone()).await;

        assert!(harness.records().await.is_empty());
        assert_eq!(tally.fetch_failures, 1);
        assert_eq!(fetcher.fetch_count("http://d.test"), 1);
        // Still claimed, so it can never be queued again
        assert!(harness.registry.claim("http://d.test").is_none());
    }

    #[tokio::test]
    async fn test_panicking_page_does_not_stop_worker() {
        let harness = Harness::new();
        harness.seed("http://a.test");
        let fetcher = GraphFetcher::new()
            .page("http://a.test", &["http://b.test", "http://c.test"])
            .page("http://c.test", &[])
            .panicking("http://b.test");

        let tally = harness.run_one(fetcher.clone()).await;

        let records = harness.records().await;
        assert!(records.contains(&ReportRecord::Visited("http://c.test".to_string())));
        assert!(!records.contains(&ReportRecord::Visited("http://b.test".to_string())));
        assert_eq!(tally.pages_visited, 2);
        assert_eq!(tally.fetch_failures, 1);
        assert_eq!(fetcher.fetch_count("http://b.test"), 1);
    }
}
