// src/links/mod.rs
// =============================================================================
// This module decides which links on a page are worth following.
//
// We use the `scraper` crate to pull the raw href value out of every <a> tag,
// then keep only candidates that look like absolute web addresses:
// - not empty
// - starting with "http" (covers http:// and https://)
// - containing at least one '.' (a domain separator)
//
// Relative links ("relative/x", "/docs", "#top") are dropped, not resolved.
// Whether a link was already visited is the registry's business, not ours.
//
// Rust concepts:
// - Iterators: links are filtered lazily while the caller walks them
// - Closures that capture state: `move` lets the filter own its seen-set
// =============================================================================

use scraper::{Html, Selector};
use std::collections::HashSet;

// The followable links of one page.
//
// Iterating is lazy and can be repeated: every call to iter() starts over
// with a fresh seen-set, so each pass yields the same links once each.
#[derive(Debug, Clone, Default)]
pub struct FollowableLinks {
    candidates: Vec<String>,
}

impl FollowableLinks {
    // Builds the sequence from raw candidate strings (e.g. href values)
    pub fn from_candidates(candidates: Vec<String>) -> Self {
        Self { candidates }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        let mut seen = HashSet::new();
        self.candidates
            .iter()
            .map(String::as_str)
            .filter(|candidate| is_followable(candidate))
            .filter(move |candidate| seen.insert(*candidate))
    }
}

// Extracts the followable links from an HTML document
//
// Example:
//   html = <a href="http://b.test">B</a> <a href="relative/x">X</a>
//   result yields "http://b.test"
pub fn extract_followable(html: &str) -> FollowableLinks {
    FollowableLinks::from_candidates(extract_candidates(html))
}

// Every href of every <a> tag, in document order, unfiltered
pub fn extract_candidates(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);

    // The selector is a constant and known to be valid
    let selector = Selector::parse("a[href]").expect("static selector parses");

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .map(str::to_string)
        .collect()
}

pub fn is_followable(candidate: &str) -> bool {
    !candidate.is_empty() && candidate.starts_with("http") && candidate.contains('.')
}
