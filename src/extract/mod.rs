//! Page extraction
//!
//! Applies an extraction profile to raw HTML, turning listing pages into
//! link sets and detail pages into structured product records. Extraction
//! never errors: a selector that matches nothing simply yields an empty
//! field, and a detail page without a usable name or price yields no
//! product at all.

mod detail;
mod listing;
mod price;

pub use detail::extract_product;
pub use listing::{extract_listing_links, ListingLinks};
pub use price::normalize_price;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A structured product record extracted from a detail page
///
/// `source_url` is the unique key within a site; ownership of the record
/// passes to the persistence collaborator, which decides insert-vs-update
/// by `(site, source_url)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// URL of the page the product was extracted from
    pub source_url: String,

    /// Product name
    pub name: String,

    /// Normalized, currency-agnostic price value
    pub price: f64,

    /// Product description (may be empty)
    pub description: String,

    /// Absolute image URLs, in page order
    pub image_urls: Vec<String>,

    /// Specification label/value pairs
    pub specifications: BTreeMap<String, String>,

    /// Product category
    pub category: String,
}
