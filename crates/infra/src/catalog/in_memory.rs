use std::sync::RwLock;

use async_trait::async_trait;

use demandcast_core::Product;

use super::ProductCatalog;
use crate::error::StoreError;

/// In-memory catalog for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryProductCatalog {
    inner: RwLock<Vec<Product>>,
}

impl InMemoryProductCatalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self {
            inner: RwLock::new(products),
        }
    }

    pub fn insert(&self, product: Product) {
        if let Ok(mut products) = self.inner.write() {
            products.push(product);
        }
    }
}

#[async_trait]
impl ProductCatalog for InMemoryProductCatalog {
    async fn list_active(&self) -> Result<Vec<Product>, StoreError> {
        let products = self
            .inner
            .read()
            .map_err(|_| StoreError::Unavailable("catalog lock poisoned".into()))?;
        Ok(products.iter().filter(|p| p.is_active()).cloned().collect())
    }
}
