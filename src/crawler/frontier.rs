//! Visited set and FIFO frontier for one breadth-first crawl

use std::collections::{HashSet, VecDeque};

/// Crawl frontier with page-budget bounded admission
///
/// URLs are compared as exact strings. The frontier is owned by a single
/// crawl loop and is never shared between tasks.
#[derive(Debug)]
pub struct Frontier {
    queue: VecDeque<String>,
    queued: HashSet<String>,
    visited: HashSet<String>,
    max_pages: usize,
}

impl Frontier {
    /// Creates a frontier seeded with one URL
    pub fn new(seed: impl Into<String>, max_pages: usize) -> Self {
        let seed = seed.into();
        let mut queued = HashSet::new();
        queued.insert(seed.clone());

        Self {
            queue: VecDeque::from([seed]),
            queued,
            visited: HashSet::new(),
            max_pages,
        }
    }

    /// Dequeues the next unvisited URL and marks it visited
    pub fn next_url(&mut self) -> Option<String> {
        while let Some(url) = self.queue.pop_front() {
            self.queued.remove(&url);
            if self.visited.insert(url.clone()) {
                return Some(url);
            }
        }
        None
    }

    /// Enqueues a discovered URL if it is new and the budget allows it
    ///
    /// `collected` is the number of pages already collected. Admission
    /// requires `collected + queued < max_pages`, so the queue never holds
    /// more work than the remaining budget.
    pub fn admit(&mut self, url: String, collected: usize) -> bool {
        if self.visited.contains(&url) || self.queued.contains(&url) {
            return false;
        }
        if collected + self.queue.len() >= self.max_pages {
            return false;
        }

        self.queued.insert(url.clone());
        self.queue.push_back(url);
        true
    }

    pub fn queued_len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
