//! Crawl orchestration
//!
//! The orchestrator owns the frontier, the visited-set, and the job state
//! machine. It drains the frontier under a concurrency bound: workers
//! perform the politeness delay, the robots check, and the fetch; link
//! extraction, product extraction, counter updates, and enqueuing all
//! happen on the orchestrator side so that within a URL's lifecycle fetch
//! strictly precedes extraction, and discovery strictly precedes enqueuing.

use crate::crawler::fetcher::{build_http_client, FetchError, Fetcher};
use crate::crawler::frontier::{Frontier, PageKind, QueuedUrl, VisitedSet};
use crate::crawler::job::{CrawlErrorRecord, CrawlJob, CrawlPhase, JobSnapshot, JobStatus};
use crate::extract::{extract_listing_links, extract_product, Product};
use crate::infer::infer_selectors;
use crate::robots::RobotsGuard;
use crate::store::{ProductStore, Upsert};
use crate::{ProfileError, Result};
use chrono::Utc;
use regex::Regex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinSet;
use url::Url;

/// Job-level behavior switches that sit outside the per-site profile
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    /// User agent sent with every request, including robots.txt fetches
    pub user_agent: String,

    /// Whether robots.txt rules are honored; when false the robots guard
    /// allows everything without fetching
    pub respect_robots: bool,

    /// Whether missing selectors may be inferred from the first fetched page
    pub infer_selectors: bool,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            user_agent: "Prospector/1.0".to_string(),
            respect_robots: true,
            infer_selectors: true,
        }
    }
}

/// Aggregated result of a finished crawl
#[derive(Debug)]
pub struct CrawlOutcome {
    /// The job with its terminal status, counters, and timestamps
    pub job: CrawlJob,

    /// Every product extracted during the crawl, in completion order
    pub products: Vec<Product>,

    /// Accumulated per-URL errors; these never aborted the job
    pub errors: Vec<CrawlErrorRecord>,

    /// How many URLs were skipped because robots.txt disallowed them
    pub robots_denied: u64,
}

impl CrawlOutcome {
    /// True when the job failed fatally (no start URL could be fetched)
    pub fn is_fatal(&self) -> bool {
        self.job.status == JobStatus::Failed
    }
}

/// Result of one worker's trip through robots check and fetch
enum TaskResult {
    Fetched { entry: QueuedUrl, body: String },
    Denied { entry: QueuedUrl },
    Failed { entry: QueuedUrl, error: FetchError },
}

/// Orchestrates a single crawl job from `Pending` to a terminal state
pub struct Orchestrator {
    job: CrawlJob,
    fetcher: Fetcher,
    robots: Arc<RobotsGuard>,
    frontier: Frontier,
    visited: VisitedSet,
    store: Option<Arc<dyn ProductStore>>,
    cancelled: Arc<AtomicBool>,
    progress_tx: watch::Sender<JobSnapshot>,
    product_pattern: Option<Regex>,
    needs_inference: bool,
    listing_enqueued: usize,
    seed_total: usize,
    seed_failures: usize,
    robots_denied: u64,
    products: Vec<Product>,
    errors: Vec<CrawlErrorRecord>,
}

impl Orchestrator {
    /// Creates an orchestrator for a job
    ///
    /// Builds the HTTP client, compiles the product URL pattern, and wires
    /// the robots guard. The job's visited-set and robots cache are scoped
    /// to this instance, so independent jobs never share state.
    pub fn new(mut job: CrawlJob, options: CrawlOptions) -> Result<Self> {
        let product_pattern = match &job.profile.product_url_pattern {
            Some(pattern) => Some(
                Regex::new(pattern)
                    .map_err(|e| ProfileError::InvalidPattern(e.to_string()))?,
            ),
            None => None,
        };

        job.limits.concurrency = job.limits.concurrency.max(1);

        let client = build_http_client(&options.user_agent, job.limits.timeout_ms)?;
        let fetcher = Fetcher::new(
            client.clone(),
            job.limits.max_retries,
            job.limits.request_delay_ms,
        );
        let robots = Arc::new(RobotsGuard::new(
            client,
            options.user_agent.clone(),
            options.respect_robots,
        ));

        let needs_inference = options.infer_selectors
            && !(job.profile.selectors.is_complete_for_listing()
                && job.profile.selectors.is_complete_for_detail());

        let (progress_tx, _progress_rx) = watch::channel(job.snapshot());

        Ok(Self {
            job,
            fetcher,
            robots,
            frontier: Frontier::new(),
            visited: VisitedSet::new(),
            store: None,
            cancelled: Arc::new(AtomicBool::new(false)),
            progress_tx,
            product_pattern,
            needs_inference,
            listing_enqueued: 0,
            seed_total: 0,
            seed_failures: 0,
            robots_denied: 0,
            products: Vec::new(),
            errors: Vec::new(),
        })
    }

    /// Attaches a persistence collaborator; extracted products are handed
    /// to it and insert/update accounting becomes live
    pub fn with_store(mut self, store: Arc<dyn ProductStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Returns the flag external code may set to cancel the job
    ///
    /// The flag is checked between frontier dequeues; in-flight fetches are
    /// allowed to finish before cancellation is observed.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    /// Subscribes to job snapshots, published after every processed page
    pub fn progress(&self) -> watch::Receiver<JobSnapshot> {
        self.progress_tx.subscribe()
    }

    /// Runs the job to completion and returns the aggregated outcome
    ///
    /// Per-page failures are accumulated and never abort the crawl; the job
    /// ends `Failed` only when every start URL ended in a fetch error.
    pub async fn run(mut self) -> Result<CrawlOutcome> {
        self.job.status = JobStatus::Running;
        self.job.started_at = Some(Utc::now());
        self.publish();

        tracing::info!(
            "Starting crawl job {} with {} start URL(s), concurrency {}",
            self.job.id,
            self.job.start_urls.len(),
            self.job.limits.concurrency
        );

        self.seed_frontier();

        let mut tasks: JoinSet<TaskResult> = JoinSet::new();

        loop {
            if self.cancelled.load(Ordering::Relaxed) {
                tracing::info!(
                    "Cancellation requested; letting {} in-flight fetch(es) finish",
                    tasks.len()
                );
                break;
            }

            if self.product_limit_reached() {
                tracing::info!(
                    "Product limit of {:?} reached, stopping",
                    self.job.limits.max_products
                );
                break;
            }

            while tasks.len() < self.job.limits.concurrency {
                let Some(entry) = self.frontier.pop() else {
                    break;
                };
                tasks.spawn(fetch_one(
                    entry,
                    self.fetcher.clone(),
                    Arc::clone(&self.robots),
                    Duration::from_millis(self.job.limits.request_delay_ms),
                ));
            }

            if tasks.is_empty() {
                tracing::info!("Frontier exhausted, crawl complete");
                break;
            }

            if let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok(result) => self.handle_result(result).await,
                    Err(e) => tracing::error!("Crawl worker panicked: {}", e),
                }
            }
        }

        // Results of fetches that were already in flight still count
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => self.handle_result(result).await,
                Err(e) => tracing::error!("Crawl worker panicked: {}", e),
            }
        }

        self.finish();

        Ok(CrawlOutcome {
            job: self.job,
            products: self.products,
            errors: self.errors,
            robots_denied: self.robots_denied,
        })
    }

    /// Seeds the frontier with the job's start URLs, classifying each as a
    /// listing or product page via the product URL pattern
    fn seed_frontier(&mut self) {
        let start_urls = self.job.start_urls.clone();
        for raw in &start_urls {
            match Url::parse(raw) {
                Err(e) => {
                    self.seed_total += 1;
                    self.seed_failures += 1;
                    self.record_error(raw, CrawlPhase::Fetch, format!("invalid start URL: {}", e));
                }
                Ok(url) => {
                    if !self.visited.insert(&url) {
                        continue;
                    }
                    let kind = self.classify(&url);
                    if kind == PageKind::Listing {
                        self.listing_enqueued += 1;
                    }
                    self.seed_total += 1;
                    self.frontier.push(QueuedUrl {
                        url,
                        kind,
                        is_seed: true,
                    });
                }
            }
        }
    }

    /// Classifies a URL as listing or product
    ///
    /// The pattern is compiled as a real regex and applied unanchored to
    /// the full URL string, so a plain substring pattern behaves as a
    /// substring test. Without a pattern every start URL is a listing.
    fn classify(&self, url: &Url) -> PageKind {
        match &self.product_pattern {
            Some(pattern) if pattern.is_match(url.as_str()) => PageKind::Product,
            _ => PageKind::Listing,
        }
    }

    async fn handle_result(&mut self, result: TaskResult) {
        match result {
            TaskResult::Denied { entry } => {
                tracing::info!("Skipping {} (disallowed by robots.txt)", entry.url);
                self.robots_denied += 1;
            }

            TaskResult::Failed { entry, error } => {
                if entry.is_seed {
                    self.seed_failures += 1;
                }
                let phase = match entry.kind {
                    PageKind::Listing => CrawlPhase::Listing,
                    PageKind::Product => CrawlPhase::Product,
                };
                self.record_error(entry.url.as_str(), phase, error.to_string());
            }

            TaskResult::Fetched { entry, body } => {
                self.job.counters.pages_crawled += 1;

                if self.needs_inference {
                    self.run_inference(&body, &entry.url);
                }

                match entry.kind {
                    PageKind::Listing => self.handle_listing(&entry, &body),
                    PageKind::Product => self.handle_product(&entry, &body).await,
                }

                if self.job.counters.pages_crawled % 10 == 0 {
                    tracing::info!(
                        "Progress: {} pages crawled, {} products found, {} URLs in frontier",
                        self.job.counters.pages_crawled,
                        self.job.counters.products_found,
                        self.frontier.len()
                    );
                }
            }
        }

        self.publish();
    }

    /// Runs selector inference once, against the first fetched page, and
    /// merges the result under the explicit profile (explicit wins)
    fn run_inference(&mut self, body: &str, page_url: &Url) {
        self.needs_inference = false;

        let inferred = infer_selectors(body, page_url);
        let mut merged = self.job.profile.selectors.clone();
        merged.merge_inferred(&inferred);

        if merged != self.job.profile.selectors {
            tracing::info!("Adopted inferred selectors for fields the profile left unset");
            self.job.profile.selectors = merged;
        }
    }

    /// Processes a fetched listing page: enqueue product links, then the
    /// pagination link while under the listing-page cap
    fn handle_listing(&mut self, entry: &QueuedUrl, body: &str) {
        let links = extract_listing_links(body, &entry.url, &self.job.profile);
        tracing::debug!(
            "Listing {} yielded {} product link(s)",
            entry.url,
            links.product_links.len()
        );

        for url in links.product_links {
            self.enqueue(url, PageKind::Product);
        }

        if let Some(next) = links.next_page_url {
            if self.listing_enqueued < self.job.limits.max_pages {
                self.enqueue(next, PageKind::Listing);
            } else {
                tracing::debug!(
                    "Listing page cap of {} reached, not following {}",
                    self.job.limits.max_pages,
                    next
                );
            }
        }
    }

    /// Processes a fetched product page: extract, count, and persist
    async fn handle_product(&mut self, entry: &QueuedUrl, body: &str) {
        let Some(product) = extract_product(body, &entry.url, &self.job.profile) else {
            // Insufficient data (no name or no valid price) is not an error
            tracing::debug!("Insufficient product data on {}", entry.url);
            return;
        };

        self.job.counters.products_found += 1;
        tracing::debug!("Extracted product '{}' from {}", product.name, entry.url);

        if let Some(store) = self.store.clone() {
            let site = self.job.profile.site_key().to_string();
            match store.upsert(&site, product.clone()).await {
                Ok(Upsert::Inserted) => self.job.counters.products_added += 1,
                Ok(Upsert::Updated) => self.job.counters.products_updated += 1,
                Err(e) => {
                    self.record_error(entry.url.as_str(), CrawlPhase::Product, e.to_string());
                }
            }
        }

        self.products.push(product);
    }

    /// Enqueues a discovered URL exactly once per job
    fn enqueue(&mut self, url: Url, kind: PageKind) {
        if !self.visited.insert(&url) {
            return;
        }
        if kind == PageKind::Listing {
            self.listing_enqueued += 1;
        }
        self.frontier.push(QueuedUrl {
            url,
            kind,
            is_seed: false,
        });
    }

    fn record_error(&mut self, url: &str, phase: CrawlPhase, message: String) {
        tracing::warn!("Error processing {} ({:?} phase): {}", url, phase, message);
        self.job.last_error = Some(message.clone());
        self.errors.push(CrawlErrorRecord {
            url: url.to_string(),
            phase,
            message,
        });
    }

    fn product_limit_reached(&self) -> bool {
        self.job
            .limits
            .max_products
            .is_some_and(|limit| self.job.counters.products_found as usize >= limit)
    }

    /// Transitions the job to its terminal state
    ///
    /// `Failed` is reserved for the fatal case where every start URL ended
    /// in a fetch error; everything else, including cancellation and
    /// accumulated per-page errors, ends `Succeeded`.
    fn finish(&mut self) {
        if self.seed_total > 0 && self.seed_failures >= self.seed_total {
            self.job.status = JobStatus::Failed;
            self.job.last_error = Some("no start URL could be fetched".to_string());
        } else {
            self.job.status = JobStatus::Succeeded;
        }
        self.job.ended_at = Some(Utc::now());
        self.publish();

        tracing::info!(
            "Crawl {} finished as {:?}: {} pages, {} products found ({} added, {} updated), {} error(s), {} robots skip(s)",
            self.job.id,
            self.job.status,
            self.job.counters.pages_crawled,
            self.job.counters.products_found,
            self.job.counters.products_added,
            self.job.counters.products_updated,
            self.errors.len(),
            self.robots_denied
        );
    }

    fn publish(&self) {
        self.progress_tx.send_replace(self.job.snapshot());
    }
}

/// One worker trip: robots gate, politeness delay, fetch
///
/// The delay applies before product-page fetches; with each of the
/// `concurrency` workers pausing `request_delay_ms` per request, the
/// aggregate rate stays within `concurrency / request_delay_ms` requests
/// per second.
async fn fetch_one(
    entry: QueuedUrl,
    fetcher: Fetcher,
    robots: Arc<RobotsGuard>,
    product_delay: Duration,
) -> TaskResult {
    if !robots.is_allowed(&entry.url).await {
        return TaskResult::Denied { entry };
    }

    if entry.kind == PageKind::Product && !product_delay.is_zero() {
        tokio::time::sleep(product_delay).await;
    }

    match fetcher.fetch(entry.url.as_str()).await {
        Ok(body) => TaskResult::Fetched { entry, body },
        Err(error) => TaskResult::Failed { entry, error },
    }
}
