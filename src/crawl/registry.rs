// src/crawl/registry.rs
// =============================================================================
// The visited registry: the set of URLs some worker has already claimed.
//
// A claim is permanent. It is taken before a URL is enqueued, so the same
// URL never enters the frontier twice, and it stays in place whether or not
// the later fetch succeeds (there is no retry).
//
// Checking membership and inserting happen in the same critical section:
// HashSet::insert already reports whether the value was new.
// =============================================================================

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A URL this run has claimed. Only the registry can create one, so holding
/// a `Claim` means the URL is owned by the holder and nobody else.
#[derive(Debug, PartialEq, Eq)]
pub struct Claim {
    url: String,
}

impl Claim {
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[derive(Debug, Default)]
pub struct VisitedRegistry {
    claimed: Mutex<HashSet<String>>,
}

impl VisitedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.claimed.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // Returns true exactly once per distinct URL, for the first caller.
    pub fn try_claim(&self, url: &str) -> bool {
        self.lock().insert(url.to_string())
    }

    // Same as try_claim(), but hands the winner a Claim to enqueue.
    pub fn claim(&self, url: &str) -> Option<Claim> {
        self.try_claim(url).then(|| Claim {
            url: url.to_string(),
        })
    }

    pub fn claimed_count(&self) -> usize {
        self.lock().len()
    }
}
