// src/crawl/coordinator.rs
// =============================================================================
// This module runs a whole crawl from one seed URL to the final summary.
//
// How it works:
// 1. Claim the seed URL and put it on the frontier
// 2. Start the report writers, then the crawl workers
// 3. Wait until the frontier is quiescent (empty, nothing in flight)
//    or until the optional deadline passes
// 4. Send one shutdown signal per crawl worker and wait for all of them
// 5. Send one shutdown signal per report writer and wait for all of them
//
// Writers are stopped last so every record a crawl worker pushed is written.
//
// Rust concepts:
// - tokio::spawn: each worker is its own task on the multi-threaded runtime
// - JoinHandle: awaiting a handle gives back the worker's return value
// - futures::future::join_all: wait for a whole pool at once
// =============================================================================

use super::{CrawlWorker, Frontier, VisitedRegistry, WorkerTally};
use crate::fetch::PageFetcher;
use crate::report::{OutputChannel, ReportSink, ReportWriter};
use anyhow::{Context, Result};
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

// Final numbers of a crawl
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlSummary {
    pub seed: String,
    pub pages_visited: usize,
    pub fetch_failures: usize,
    pub links_discovered: usize,
    /// Distinct URLs claimed, fetched or not
    pub urls_claimed: usize,
    pub records_written: usize,
    pub crawl_workers: usize,
    pub report_writers: usize,
    /// True when the deadline stopped the crawl before it ran out of work
    pub timed_out: bool,
    pub elapsed_ms: u128,
}

// A configured crawl, ready to run
pub struct Crawl<F> {
    fetcher: Arc<F>,
    sink: Arc<ReportSink>,
    crawl_workers: usize,
    report_writers: usize,
    deadline: Option<Duration>,
}

impl<F: PageFetcher> Crawl<F> {
    pub fn new(fetcher: F, sink: ReportSink) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            sink: Arc::new(sink),
            crawl_workers: 10,
            report_writers: 10,
            deadline: None,
        }
    }

    // Pool sizes are clamped to at least one worker each
    pub fn crawl_workers(mut self, count: usize) -> Self {
        self.crawl_workers = count.max(1);
        self
    }

    pub fn report_writers(mut self, count: usize) -> Self {
        self.report_writers = count.max(1);
        self
    }

    pub fn deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub async fn run(self, seed: &str) -> Result<CrawlSummary> {
        let started = Instant::now();

        let registry = Arc::new(VisitedRegistry::new());
        let frontier = Arc::new(Frontier::new());
        let output = Arc::new(OutputChannel::new());

        // A fresh registry always grants the first claim
        if let Some(claim) = registry.claim(seed) {
            frontier.push(claim);
        }

        let writers: Vec<JoinHandle<usize>> = (0..self.report_writers)
            .map(|id| {
                let writer = ReportWriter::new(id, Arc::clone(&output), Arc::clone(&self.sink));
                tokio::spawn(writer.run())
            })
            .collect();

        let crawlers: Vec<JoinHandle<WorkerTally>> = (0..self.crawl_workers)
            .map(|id| {
                let worker = CrawlWorker::new(
                    id,
                    Arc::clone(&frontier),
                    Arc::clone(&registry),
                    Arc::clone(&output),
                    Arc::clone(&self.fetcher),
                );
                tokio::spawn(worker.run())
            })
            .collect();

        info!(
            seed,
            crawl_workers = self.crawl_workers,
            report_writers = self.report_writers,
            "crawl started"
        );

        let timed_out = match self.deadline {
            Some(limit) => tokio::time::timeout(limit, frontier.wait_quiescent())
                .await
                .is_err(),
            None => {
                frontier.wait_quiescent().await;
                false
            }
        };

        if timed_out {
            let in_flight = frontier.in_flight();
            let discarded = frontier.shutdown_now(self.crawl_workers);
            warn!(discarded, in_flight, "deadline reached, stopping crawl workers");
        } else {
            for _ in 0..self.crawl_workers {
                frontier.close_for_worker();
            }
        }

        // A worker task that died is logged and skipped, so the writers
        // below are always shut down and drained
        let mut tally = WorkerTally::default();
        for result in join_all(crawlers).await {
            match result {
                Ok(worker_tally) => tally += worker_tally,
                Err(e) => warn!("crawl worker stopped abnormally: {}", e),
            }
        }

        // Only a deadline leaves work behind: pages pushed by workers that
        // were still busy when the shutdown signals went out
        if !frontier.is_empty() {
            debug!(leftover = frontier.len(), "frontier entries left uncrawled");
        }

        for _ in 0..self.report_writers {
            output.close_for_worker();
        }

        let mut records_written = 0;
        for result in join_all(writers).await {
            match result {
                Ok(written) => records_written += written,
                Err(e) => warn!("report writer stopped abnormally: {}", e),
            }
        }
        self.sink.flush().context("failed to flush report")?;

        info!(
            pages_visited = tally.pages_visited,
            claimed = registry.claimed_count(),
            "The crawl has finished"
        );

        Ok(CrawlSummary {
            seed: seed.to_string(),
            pages_visited: tally.pages_visited,
            fetch_failures: tally.fetch_failures,
            links_discovered: tally.links_discovered,
            urls_claimed: registry.claimed_count(),
            records_written,
            crawl_workers: self.crawl_workers,
            report_writers: self.report_writers,
            timed_out,
            elapsed_ms: started.elapsed().as_millis(),
        })
    }
}
