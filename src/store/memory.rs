use crate::extract::Product;
use crate::store::{ProductStore, StoreError, Upsert};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory product store keyed by `(site, source_url)`
///
/// The reference implementation of the store contract; real deployments
/// substitute a database-backed collaborator.
#[derive(Debug, Default)]
pub struct MemoryStore {
    products: Mutex<HashMap<(String, String), Product>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored products
    pub fn len(&self) -> usize {
        self.products.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns every stored product for a site
    pub fn products_for_site(&self, site: &str) -> Vec<Product> {
        self.products
            .lock()
            .unwrap()
            .iter()
            .filter(|((s, _), _)| s == site)
            .map(|(_, product)| product.clone())
            .collect()
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn find_existing(
        &self,
        site: &str,
        source_url: &str,
    ) -> Result<Option<Product>, StoreError> {
        let key = (site.to_string(), source_url.to_string());
        Ok(self.products.lock().unwrap().get(&key).cloned())
    }

    async fn upsert(&self, site: &str, product: Product) -> Result<Upsert, StoreError> {
        let key = (site.to_string(), product.source_url.clone());
        let mut products = self.products.lock().unwrap();

        let outcome = if products.contains_key(&key) {
            Upsert::Updated
        } else {
            Upsert::Inserted
        };
        products.insert(key, product);

        Ok(outcome)
    }
}
