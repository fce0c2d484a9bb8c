//! Forecast persistence port.

use std::sync::Arc;

use async_trait::async_trait;

use demandcast_core::ForecastRow;

use crate::error::StoreError;

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryForecastStore;
pub use postgres::PostgresForecastStore;

/// Idempotent sink for forecast rows.
///
/// Rows are keyed by `(product_id, forecast_date, scenario)`; writing the same
/// key again overwrites the previous values. A call either stores the whole
/// batch or fails.
#[async_trait]
pub trait PersistenceStore: Send + Sync {
    /// Returns the number of rows written.
    async fn upsert_forecasts(&self, rows: &[ForecastRow]) -> Result<usize, StoreError>;
}

#[async_trait]
impl<S> PersistenceStore for Arc<S>
where
    S: PersistenceStore + ?Sized,
{
    async fn upsert_forecasts(&self, rows: &[ForecastRow]) -> Result<usize, StoreError> {
        (**self).upsert_forecasts(rows).await
    }
}
