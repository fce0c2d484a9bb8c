//! Forecast output types.
//!
//! A `ForecastPoint` is the unit produced by the demand model and tagged by a
//! scenario. A `ForecastRow` is the same point bound to a tenant/product, ready
//! for persistence under the unique key `(product_id, forecast_date, scenario)`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::id::{ProductId, TenantId};

/// Named, deterministic adjustment profile applied uniformly to a forecast.
///
/// Unknown names are kept verbatim (so the persisted tag matches the request)
/// and behave like `Base`.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Scenario {
    #[default]
    Base,
    Optimistic,
    Crisis,
    Custom(String),
}

impl Scenario {
    /// The scenario set every synchronization run produces.
    pub const STANDARD: [Scenario; 3] = [Scenario::Base, Scenario::Optimistic, Scenario::Crisis];

    pub fn parse(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "base" => Scenario::Base,
            "optimistic" => Scenario::Optimistic,
            "crisis" => Scenario::Crisis,
            _ => Scenario::Custom(name.trim().to_string()),
        }
    }

    pub fn multiplier(&self) -> f64 {
        match self {
            Scenario::Base => 1.0,
            Scenario::Optimistic => 1.25,
            Scenario::Crisis => 0.65,
            Scenario::Custom(_) => 1.0,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Scenario::Base => "base",
            Scenario::Optimistic => "optimistic",
            Scenario::Crisis => "crisis",
            Scenario::Custom(name) => name,
        }
    }
}

impl core::fmt::Display for Scenario {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Scenario {
    fn from(value: String) -> Self {
        Scenario::parse(&value)
    }
}

impl From<&str> for Scenario {
    fn from(value: &str) -> Self {
        Scenario::parse(value)
    }
}

impl From<Scenario> for String {
    fn from(value: Scenario) -> Self {
        value.as_str().to_string()
    }
}

/// One forecast day.
///
/// Invariants (enforced by the producers): `predicted_demand >= 0` and
/// `confidence_lower <= predicted_demand <= confidence_upper`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub predicted_demand: f64,
    pub confidence_lower: f64,
    pub confidence_upper: f64,
    pub scenario: Scenario,
    pub model_version: String,
}

impl ForecastPoint {
    pub fn is_well_formed(&self) -> bool {
        self.predicted_demand >= 0.0
            && self.confidence_lower <= self.predicted_demand
            && self.predicted_demand <= self.confidence_upper
    }
}

/// Unique persistence key of a forecast row.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ForecastKey {
    pub product_id: ProductId,
    pub forecast_date: NaiveDate,
    pub scenario: Scenario,
}

/// A forecast point bound to its tenant and product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    pub tenant_id: TenantId,
    pub product_id: ProductId,
    pub forecast_date: NaiveDate,
    pub scenario: Scenario,
    pub predicted_demand: f64,
    pub confidence_lower: f64,
    pub confidence_upper: f64,
    pub model_version: String,
}

impl ForecastRow {
    pub fn from_point(tenant_id: TenantId, product_id: ProductId, point: ForecastPoint) -> Self {
        Self {
            tenant_id,
            product_id,
            forecast_date: point.date,
            scenario: point.scenario,
            predicted_demand: point.predicted_demand,
            confidence_lower: point.confidence_lower,
            confidence_upper: point.confidence_upper,
            model_version: point.model_version,
        }
    }

    pub fn key(&self) -> ForecastKey {
        ForecastKey {
            product_id: self.product_id,
            forecast_date: self.forecast_date,
            scenario: self.scenario.clone(),
        }
    }
}
