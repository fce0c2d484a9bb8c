//! Infrastructure layer: storage adapters, external data providers, config,
//! and the batch synchronization driver.

pub mod catalog;
pub mod config;
pub mod error;
pub mod external;
pub mod forecast_store;
pub mod retry;
pub mod sales;
pub mod sync;

pub use catalog::{InMemoryProductCatalog, PostgresProductCatalog, ProductCatalog};
pub use config::{ConfigError, DatabaseConfig, ProviderConfig, SyncConfig};
pub use error::{ExternalDataError, StoreError};
pub use external::{
    DailyTemperature, HolidayProvider, Location, NagerHolidays, OpenMeteoWeather, PublicHoliday, RegressorProvider,
    WeatherProvider,
};
pub use forecast_store::{InMemoryForecastStore, PersistenceStore, PostgresForecastStore};
pub use retry::{BackoffStrategy, RetryPolicy};
pub use sales::{InMemorySalesSource, PostgresSalesSource, SalesSource, SyntheticHistory};
pub use sync::{CancelHandle, CancelSignal, SyncOrchestrator, SyncReport, SyncStatus, cancellation};
