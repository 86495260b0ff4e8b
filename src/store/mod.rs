//! Product persistence contract
//!
//! The crawler does not implement storage itself: each extracted product is
//! handed to a [`ProductStore`] collaborator, which decides insert-vs-update
//! by `(site, source_url)`. [`MemoryStore`] is the in-process reference
//! implementation used by the CLI and by tests.

mod memory;

pub use memory::MemoryStore;

use crate::extract::Product;
use async_trait::async_trait;
use thiserror::Error;

/// Storage-side failures surfaced to the orchestrator
///
/// A store error on one product is recorded on the job and does not abort
/// the crawl.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Outcome of an upsert, as decided by the store's existence check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Updated,
}

/// Two-operation persistence contract for extracted products
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Looks up a previously stored product by site and source URL
    async fn find_existing(
        &self,
        site: &str,
        source_url: &str,
    ) -> Result<Option<Product>, StoreError>;

    /// Inserts or updates a product, keyed by `(site, source_url)`
    async fn upsert(&self, site: &str, product: Product) -> Result<Upsert, StoreError>;
}
