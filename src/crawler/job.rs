//! Crawl job state, limits, and accounting

use crate::profile::ExtractionProfile;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Resource and politeness limits for a single crawl job
#[derive(Debug, Clone, Serialize)]
pub struct CrawlLimits {
    /// Stop once this many products have been found
    pub max_products: Option<usize>,

    /// Hard cap on listing pages traversed, independent of whether a next
    /// link still exists
    pub max_pages: usize,

    /// Number of simultaneous in-flight fetches
    pub concurrency: usize,

    /// Politeness delay before each product-page fetch, in milliseconds;
    /// also the backoff unit for fetch retries
    pub request_delay_ms: u64,

    /// Total fetch attempts per URL
    pub max_retries: u32,

    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for CrawlLimits {
    fn default() -> Self {
        Self {
            max_products: None,
            max_pages: 10,
            concurrency: 2,
            request_delay_ms: 1000,
            max_retries: 3,
            timeout_ms: 10_000,
        }
    }
}

/// Lifecycle of a crawl job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

/// Progress counters exposed to status consumers
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct JobCounters {
    pub pages_crawled: u64,
    pub products_found: u64,
    pub products_added: u64,
    pub products_updated: u64,
}

/// Which phase of processing a URL failed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlPhase {
    Listing,
    Product,
    Fetch,
}

/// A non-fatal per-URL failure accumulated during the crawl
///
/// These never abort the job by themselves; they are surfaced in the final
/// outcome and summarized by the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlErrorRecord {
    pub url: String,
    pub phase: CrawlPhase,
    pub message: String,
}

/// A single crawl job: its inputs, lifecycle state, and counters
#[derive(Debug, Clone)]
pub struct CrawlJob {
    pub id: String,
    pub start_urls: Vec<String>,
    pub profile: ExtractionProfile,
    pub limits: CrawlLimits,
    pub status: JobStatus,
    pub counters: JobCounters,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl CrawlJob {
    /// Creates a pending job
    ///
    /// When `start_urls` is empty the profile's own start URLs are used.
    pub fn new(
        profile: ExtractionProfile,
        limits: CrawlLimits,
        start_urls: Vec<String>,
    ) -> Self {
        let start_urls = if start_urls.is_empty() {
            profile.start_urls.clone()
        } else {
            start_urls
        };

        Self {
            id: format!("job-{}", Utc::now().timestamp_millis()),
            start_urls,
            profile,
            limits,
            status: JobStatus::Pending,
            counters: JobCounters::default(),
            started_at: None,
            ended_at: None,
            last_error: None,
        }
    }

    /// Point-in-time view for external status consumers
    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            id: self.id.clone(),
            status: self.status,
            counters: self.counters,
            started_at: self.started_at,
            ended_at: self.ended_at,
            last_error: self.last_error.clone(),
        }
    }
}

/// Serializable snapshot of a job's externally visible state
#[derive(Debug, Clone, Serialize)]
pub struct JobSnapshot {
    pub id: String,
    pub status: JobStatus,
    pub counters: JobCounters,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}
