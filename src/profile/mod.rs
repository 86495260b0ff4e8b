//! Extraction profiles
//!
//! A profile is the declarative, per-site description of how to find links
//! and fields in HTML: CSS selectors for listing and detail pages, a URL
//! pattern that identifies product pages, and a price-format hint. Profiles
//! are supplied externally as JSON documents and are immutable once a crawl
//! starts; missing selector fields trigger inference.
//!
//! # Example
//!
//! ```no_run
//! use prospector::profile::load_profile;
//! use std::path::Path;
//!
//! let profile = load_profile(Path::new("profiles/example.json")).unwrap();
//! println!("Crawling {}", profile.base_url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{ExtractionProfile, PriceFormat, SelectorSet};

// Re-export parser functions
pub use parser::{load_profile, parse_profile};
pub use validation::validate;
