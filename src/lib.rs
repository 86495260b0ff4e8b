//! Prospector: a site-agnostic product crawler
//!
//! This crate implements a polite e-commerce crawler: given start URLs and a
//! declarative extraction profile, it discovers listing pages, follows
//! pagination, and extracts structured product records, respecting
//! robots.txt and rate limits. When a profile is missing selectors, a
//! heuristic inference engine proposes them from the page structure.

pub mod crawler;
pub mod extract;
pub mod infer;
pub mod profile;
pub mod robots;
pub mod store;
pub mod urls;

use thiserror::Error;

/// Main error type for Prospector operations
#[derive(Debug, Error)]
pub enum ProspectorError {
    #[error("Profile error: {0}")]
    Profile(#[from] ProfileError),

    #[error(transparent)]
    Fetch(#[from] crawler::FetchError),

    #[error("Fatal job failure: {0}")]
    JobFatal(String),

    #[error("Store error: {0}")]
    Store(#[from] store::StoreError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Profile-specific errors
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Failed to read profile file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse profile JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in profile: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector for '{field}': {message}")]
    InvalidSelector { field: &'static str, message: String },

    #[error("Invalid product URL pattern: {0}")]
    InvalidPattern(String),
}

/// Result type alias for Prospector operations
pub type Result<T> = std::result::Result<T, ProspectorError>;

/// Result type alias for profile operations
pub type ProfileResult<T> = std::result::Result<T, ProfileError>;

// Re-export commonly used types
pub use crawler::{
    CrawlErrorRecord, CrawlJob, CrawlLimits, CrawlOptions, CrawlOutcome, JobStatus, Orchestrator,
};
pub use extract::Product;
pub use profile::{ExtractionProfile, PriceFormat, SelectorSet};
