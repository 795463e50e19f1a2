//! Crawl frontier: visited set, depth bookkeeping and level hand-off
//!
//! The frontier decides, level by level, which URLs are new and in scope.
//! Admission is atomic: checking a URL against the visited set and inserting
//! it happens under one lock, so concurrent callers never admit the same URL
//! twice.

use crate::url::is_in_scope;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};
use url::Url;

/// Breadth-first crawl frontier
#[derive(Debug)]
pub struct Frontier {
    /// The seed URL; its host defines the scope
    scope: Url,

    /// Deepest level that is fetched (the seed is level 0)
    max_depth: u32,

    /// Level currently being fetched
    depth: u32,

    /// Every URL ever scheduled, keyed by its serialized form
    visited: Mutex<HashSet<String>>,

    /// URLs admitted for the next level
    pending: Mutex<Vec<Url>>,
}

impl Frontier {
    /// Creates a frontier for a crawl starting at `seed`
    ///
    /// The seed is marked visited immediately, so a page linking back to it
    /// never schedules it again.
    pub fn new(seed: Url, max_depth: u32) -> Self {
        let mut visited = HashSet::new();
        visited.insert(seed.as_str().to_string());

        Self {
            scope: seed,
            max_depth,
            depth: 0,
            visited: Mutex::new(visited),
            pending: Mutex::new(Vec::new()),
        }
    }

    /// The seed URL
    pub fn scope(&self) -> &Url {
        &self.scope
    }

    /// Level currently being fetched
    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// The first level: the seed alone
    ///
    /// The seed is fetched unconditionally; it defines the scope rather than
    /// being checked against it.
    pub fn seed_level(&self) -> Vec<Url> {
        vec![self.scope.clone()]
    }

    /// Whether links found at the current level can still be followed
    pub fn accepts_links(&self) -> bool {
        self.depth < self.max_depth
    }

    /// Number of URLs marked visited so far, the seed included
    pub fn visited_count(&self) -> usize {
        lock(&self.visited).len()
    }

    /// Returns true if `url` has already been scheduled
    pub fn is_visited(&self, url: &Url) -> bool {
        lock(&self.visited).contains(url.as_str())
    }

    /// Admits newly discovered links for the next level
    ///
    /// Returns the candidates that are in scope and not yet visited, in input
    /// order, and marks them visited. The admitted URLs are also queued for
    /// the next level. At the last level nothing is admitted.
    ///
    /// Safe to call concurrently: the subsets returned by concurrent calls
    /// are disjoint.
    pub fn admit<I>(&self, candidates: I) -> Vec<Url>
    where
        I: IntoIterator<Item = Url>,
    {
        if !self.accepts_links() {
            return Vec::new();
        }

        let admitted: Vec<Url> = {
            let mut visited = lock(&self.visited);
            candidates
                .into_iter()
                .filter(|url| is_in_scope(&self.scope, url))
                .filter(|url| visited.insert(url.as_str().to_string()))
                .collect()
        };

        if !admitted.is_empty() {
            lock(&self.pending).extend(admitted.iter().cloned());
        }

        admitted
    }

    /// Moves to the next level
    ///
    /// Returns the URLs admitted during the current level, or None when the
    /// crawl is over: the current level was the last one, or nothing new was
    /// admitted.
    pub fn advance(&mut self) -> Option<Vec<Url>> {
        if !self.accepts_links() {
            return None;
        }

        let next = std::mem::take(
            self.pending
                .get_mut()
                .unwrap_or_else(PoisonError::into_inner),
        );
        if next.is_empty() {
            return None;
        }

        self.depth += 1;
        Some(next)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
