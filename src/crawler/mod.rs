//! Crawl execution
//!
//! This module contains the moving parts of a crawl:
//! - HTTP fetching with retry and backoff
//! - The frontier queue and visited-set
//! - Crawl job state, limits, and counters
//! - The orchestrator that drives a job to completion

mod fetcher;
mod frontier;
mod job;
mod orchestrator;

pub use fetcher::{build_http_client, FetchCause, FetchError, Fetcher};
pub use frontier::{Frontier, PageKind, QueuedUrl, VisitedSet};
pub use job::{
    CrawlErrorRecord, CrawlJob, CrawlLimits, CrawlPhase, JobCounters, JobSnapshot, JobStatus,
};
pub use orchestrator::{CrawlOptions, CrawlOutcome, Orchestrator};
