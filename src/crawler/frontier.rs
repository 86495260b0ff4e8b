//! Frontier queue and visited-set
//!
//! The frontier holds not-yet-fetched URLs; the visited-set guarantees that
//! no URL is enqueued (and therefore fetched) twice within one job. Both
//! are scoped to a single job instance and shared across workers behind
//! short-held mutexes.

use crate::urls::normalize;
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use url::Url;

/// Whether a frontier entry is expected to be a listing or a product page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Listing,
    Product,
}

/// A URL queued for fetching
#[derive(Debug, Clone)]
pub struct QueuedUrl {
    pub url: Url,
    pub kind: PageKind,

    /// True for the job's start URLs; their collective failure is fatal
    pub is_seed: bool,
}

/// FIFO queue of not-yet-fetched URLs
///
/// Multiple workers may dequeue concurrently; each entry is handed to
/// exactly one caller.
#[derive(Debug, Default)]
pub struct Frontier {
    queue: Mutex<VecDeque<QueuedUrl>>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues a URL at the back of the frontier
    pub fn push(&self, entry: QueuedUrl) {
        self.queue.lock().unwrap().push_back(entry);
    }

    /// Dequeues the next URL, if any
    pub fn pop(&self) -> Option<QueuedUrl> {
        self.queue.lock().unwrap().pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().unwrap().is_empty()
    }
}

/// Set of normalized URLs already claimed by this job
///
/// Grows monotonically and is never persisted across jobs: a restarted job
/// begins with a fresh set. The orchestrator consults it at enqueue time,
/// so a URL discovered again via a different page is never re-enqueued.
#[derive(Debug, Default)]
pub struct VisitedSet {
    seen: Mutex<HashSet<String>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims a URL; returns false if it was already claimed
    pub fn insert(&self, url: &Url) -> bool {
        self.seen.lock().unwrap().insert(normalize(url))
    }

    /// Checks whether a URL has been claimed
    pub fn contains(&self, url: &Url) -> bool {
        self.seen.lock().unwrap().contains(&normalize(url))
    }

    pub fn len(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}
