//! Sales history port.

use std::sync::Arc;

use async_trait::async_trait;

use demandcast_core::SalesRecord;

use crate::error::StoreError;

pub mod in_memory;
pub mod postgres;
pub mod synthetic;

pub use in_memory::InMemorySalesSource;
pub use postgres::PostgresSalesSource;
pub use synthetic::SyntheticHistory;

/// Source of recent per-product daily sales.
#[async_trait]
pub trait SalesSource: Send + Sync {
    /// Sales rows for the last `days` days (today inclusive), any product.
    ///
    /// Rows may repeat a (product, date) pair; callers aggregate.
    async fn recent(&self, days: u32) -> Result<Vec<SalesRecord>, StoreError>;
}

#[async_trait]
impl<S> SalesSource for Arc<S>
where
    S: SalesSource + ?Sized,
{
    async fn recent(&self, days: u32) -> Result<Vec<SalesRecord>, StoreError> {
        (**self).recent(days).await
    }
}
