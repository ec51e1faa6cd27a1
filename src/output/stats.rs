//! Per-prefix classification statistics and prefix suggestion
//!
//! Pipeline workers record every doc/non-doc decision against each ancestor
//! prefix of the page path. After a run the counts suggest a path prefix for
//! future crawls of the same site. The suggestion is advisory only.

use std::collections::BTreeMap;
use std::sync::Mutex;
use url::Url;

/// Doc and non-doc hits under one prefix
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrefixCounts {
    pub doc: u64,
    pub non_doc: u64,
}

impl PrefixCounts {
    /// Fraction of pages under the prefix classified as documentation
    pub fn purity(&self) -> f64 {
        let total = self.doc + self.non_doc;
        if total == 0 {
            0.0
        } else {
            self.doc as f64 / total as f64
        }
    }
}

/// Concurrency-safe prefix statistics for one indexing run
///
/// Keys are `/a`, `/a/b`, ... for every page. A `BTreeMap` keeps iteration
/// (and therefore tie breaking) deterministic.
#[derive(Debug, Default)]
pub struct PrefixStats {
    counts: Mutex<BTreeMap<String, PrefixCounts>>,
}

impl PrefixStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one classification against every ancestor prefix of `url`
    pub fn record(&self, url: &Url, is_doc: bool) {
        let prefixes = ancestor_prefixes(url.path());
        if prefixes.is_empty() {
            return;
        }

        let mut counts = self.counts.lock().unwrap_or_else(|e| e.into_inner());
        for prefix in prefixes {
            let entry = counts.entry(prefix).or_default();
            if is_doc {
                entry.doc += 1;
            } else {
                entry.non_doc += 1;
            }
        }
    }

    /// Counts recorded for one prefix
    pub fn get(&self, prefix: &str) -> Option<PrefixCounts> {
        self.counts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(prefix)
            .copied()
    }

    /// Copy of all counts
    pub fn snapshot(&self) -> BTreeMap<String, PrefixCounts> {
        self.counts.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Suggests the best documentation prefix seen in this run
    pub fn suggest(&self) -> Option<String> {
        suggest_prefix(&self.snapshot())
    }
}

/// Picks the highest scoring prefix
///
/// Candidates need at least 2 doc hits and strictly more doc than non-doc
/// hits. Score is `purity * doc + 0.1 * depth`; the first strictly higher
/// score wins.
pub fn suggest_prefix(counts: &BTreeMap<String, PrefixCounts>) -> Option<String> {
    let mut best: Option<(&str, f64)> = None;

    for (prefix, c) in counts {
        if prefix.is_empty() || prefix == "/" {
            continue;
        }
        if c.doc < 2 || c.doc <= c.non_doc {
            continue;
        }

        let depth = prefix.split('/').filter(|s| !s.is_empty()).count();
        let score = c.purity() * c.doc as f64 + depth as f64 * 0.1;

        if score > best.map_or(0.0, |(_, s)| s) {
            best = Some((prefix, score));
        }
    }

    best.map(|(prefix, _)| prefix.to_string())
}

/// `/a/b/c` yields `/a`, `/a/b`, `/a/b/c`
pub fn ancestor_prefixes(path: &str) -> Vec<String> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    (1..=segments.len())
        .map(|n| format!("/{}", segments[..n].join("/")))
        .collect()
}
