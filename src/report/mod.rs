// src/report/mod.rs
// =============================================================================
// This module handles the crawl report: what gets printed while we crawl.
//
// Submodules:
// - writer: the report writer workers that drain the output channel
//
// Line shapes:
//   "<url>\n"     a page we visited
//   "\t<url>\n"   a link first discovered on that page
//
// Crawl workers never write to the sink directly. They push records onto the
// output channel and carry on crawling; the writers do the (slow) output.
// =============================================================================

mod writer;

use crate::crawl::WorkQueue;
use anyhow::{Context, Result};
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::{Mutex, PoisonError};

pub use writer::ReportWriter;

// One line of the report
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportRecord {
    /// A page that was fetched successfully
    Visited(String),
    /// A link found on a visited page and admitted to the frontier
    Discovered(String),
}

impl ReportRecord {
    pub fn url(&self) -> &str {
        match self {
            ReportRecord::Visited(url) | ReportRecord::Discovered(url) => url,
        }
    }
}

impl fmt::Display for ReportRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportRecord::Visited(url) => writeln!(f, "{}", url),
            ReportRecord::Discovered(url) => writeln!(f, "\t{}", url),
        }
    }
}

/// Queue between crawl workers and report writers.
pub type OutputChannel = WorkQueue<ReportRecord>;

// Where report lines end up: stdout, a file, or (in tests) a buffer
//
// Each record is written while holding the lock, so lines from different
// writers never interleave mid-line.
pub struct ReportSink {
    out: Mutex<Box<dyn Write + Send>>,
}

impl ReportSink {
    pub fn new(out: impl Write + Send + 'static) -> Self {
        Self {
            out: Mutex::new(Box::new(out)),
        }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    // Creates (or truncates) the report file
    pub fn file(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("cannot create report file {}", path.display()))?;
        Ok(Self::new(BufWriter::new(file)))
    }

    pub fn write_record(&self, record: &ReportRecord) -> io::Result<()> {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        write!(out, "{}", record)?;
        // Flush per line so the report streams while the crawl runs
        out.flush()
    }

    pub fn flush(&self) -> io::Result<()> {
        self.out
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .flush()
    }
}

// In-memory sink shared between a ReportSink and the test that inspects it
#[cfg(test)]
#[derive(Clone, Default)]
pub(crate) struct SharedBuffer(std::sync::Arc<Mutex<Vec<u8>>>);

#[cfg(test)]
impl SharedBuffer {
    pub(crate) fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

#[cfg(test)]
impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
