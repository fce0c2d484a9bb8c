//! Product catalog port.

use std::sync::Arc;

use async_trait::async_trait;

use demandcast_core::Product;

use crate::error::StoreError;

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryProductCatalog;
pub use postgres::PostgresProductCatalog;

/// Read-only view of the products eligible for forecasting.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Active products across every tenant the store can see.
    async fn list_active(&self) -> Result<Vec<Product>, StoreError>;
}

#[async_trait]
impl<S> ProductCatalog for Arc<S>
where
    S: ProductCatalog + ?Sized,
{
    async fn list_active(&self) -> Result<Vec<Product>, StoreError> {
        (**self).list_active().await
    }
}
