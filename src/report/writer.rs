// src/report/writer.rs
// =============================================================================
// A report writer: pops records off the output channel and writes them out.
//
// Writers run until they receive their shutdown signal. They do no other
// work, so the order of lines across pages is whatever order they were
// popped in.
// =============================================================================

use super::{OutputChannel, ReportSink};
use crate::crawl::Message;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct ReportWriter {
    id: usize,
    channel: Arc<OutputChannel>,
    sink: Arc<ReportSink>,
}

impl ReportWriter {
    pub fn new(id: usize, channel: Arc<OutputChannel>, sink: Arc<ReportSink>) -> Self {
        Self { id, channel, sink }
    }

    // Returns how many records this writer wrote
    pub async fn run(self) -> usize {
        let mut written = 0;

        while let Message::Item(record) = self.channel.pop().await {
            // A broken sink (closed pipe, full disk) costs us the line,
            // never the writer
            match self.sink.write_record(&record) {
                Ok(()) => written += 1,
                Err(e) => warn!(writer = self.id, url = record.url(), "failed to write report line: {}", e),
            }
        }

        debug!(writer = self.id, written, "report writer stopped");
        written
    }
}
