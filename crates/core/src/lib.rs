//! `demandcast-core`: domain foundation for demand forecasting.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, products, sales observations, forecast points and scenarios.

pub mod clock;
pub mod error;
pub mod forecast;
pub mod id;
pub mod numeric;
pub mod product;
pub mod sales;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::DomainError;
pub use forecast::{ForecastKey, ForecastPoint, ForecastRow, Scenario};
pub use id::{ProductId, TenantId};
pub use numeric::round_to;
pub use product::{Product, ProductStatus};
pub use sales::{SalesObservation, SalesRecord};
