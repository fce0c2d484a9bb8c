//! Request/response handlers for the forecasting entry points.
//!
//! Transport-agnostic: an HTTP layer deserializes into these DTOs, calls
//! [`ForecastEndpoints`], and maps [`RequestError`] onto a status code and the
//! JSON body from [`RequestError::body`].

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::{error, info};

use demandcast_core::{ForecastPoint, SalesObservation, Scenario};

use crate::covariates::CovariateTable;
use crate::demand::DemandModel;
use crate::purchase::{PurchaseAdvisor, StockPolicy};
use crate::result::ForecastError;
use crate::risk::RiskEngine;
use crate::scenario;

pub const DEFAULT_FORECAST_HORIZON: usize = 7;
pub const DEFAULT_DEMAND_DAYS: usize = 30;
pub const MAX_HORIZON: usize = 365;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub date: NaiveDate,
    pub value: f64,
}

impl From<&HistoryPoint> for SalesObservation {
    fn from(p: &HistoryPoint) -> Self {
        SalesObservation::new(p.date, p.value)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastRequest {
    #[serde(alias = "sales_history")]
    pub history: Vec<HistoryPoint>,
    #[serde(alias = "days_to_forecast", default = "default_forecast_horizon")]
    pub horizon: usize,
    #[serde(default)]
    pub scenario: Option<String>,
    /// Rows of `{"date": ..., "<column>": number|bool}`.
    #[serde(default)]
    pub regressors: Option<Vec<Map<String, Value>>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DemandRequest {
    pub product_id: String,
    pub history: Vec<HistoryPoint>,
    #[serde(default = "default_demand_days")]
    pub days: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RiskRequest {
    #[serde(default)]
    pub product_id: Option<String>,
    pub stock: f64,
    pub days_to_expiry: i64,
    pub avg_daily_sales: f64,
    #[serde(default)]
    pub product_cost: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PurchaseRequest {
    #[serde(default)]
    pub product_id: Option<String>,
    pub current_stock: f64,
    pub min_stock: f64,
    pub max_stock: f64,
    pub predicted_demand_next_7d: f64,
}

fn default_forecast_horizon() -> usize {
    DEFAULT_FORECAST_HORIZON
}

fn default_demand_days() -> usize {
    DEFAULT_DEMAND_DAYS
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResponse {
    pub scenario: Scenario,
    pub forecast: Vec<ForecastPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemandResponse {
    pub product_id: String,
    pub forecast: Vec<ForecastPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    pub expiration_risk_score: f64,
    pub waste_risk_score: f64,
    pub days_of_inventory: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchaseResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    pub recommended_purchase_qty: f64,
    pub reason: String,
    pub projected_stock_7d: f64,
}

// -------------------------
// Errors
// -------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequestError {
    /// Malformed or empty input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Model or internal failure; carries a diagnostic message only.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RequestError {
    pub fn status_code(&self) -> u16 {
        match self {
            RequestError::BadRequest(_) => 400,
            RequestError::Internal(_) => 500,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            RequestError::BadRequest(_) => "bad_request",
            RequestError::Internal(_) => "internal_error",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            RequestError::BadRequest(m) | RequestError::Internal(m) => m,
        }
    }

    pub fn body(&self) -> Value {
        json!({
            "error": self.code(),
            "message": self.message(),
        })
    }
}

impl From<ForecastError> for RequestError {
    fn from(e: ForecastError) -> Self {
        match e {
            ForecastError::InvalidInput(msg) => RequestError::BadRequest(msg),
            ForecastError::EmptyHistory => RequestError::BadRequest(e.to_string()),
            other => RequestError::Internal(other.to_string()),
        }
    }
}

fn bad_request(message: impl Into<String>) -> RequestError {
    RequestError::BadRequest(message.into())
}

// -------------------------
// Handlers
// -------------------------

/// Stateless handlers over a shared demand model.
#[derive(Clone)]
pub struct ForecastEndpoints {
    model: Arc<DemandModel>,
}

impl ForecastEndpoints {
    pub fn new(model: Arc<DemandModel>) -> Self {
        Self { model }
    }

    pub fn forecast(&self, req: ForecastRequest) -> Result<ForecastResponse, RequestError> {
        if req.history.is_empty() {
            return Err(bad_request("no historical data provided"));
        }
        check_horizon(req.horizon)?;

        let covariates = match &req.regressors {
            Some(rows) if !rows.is_empty() => {
                info!(rows = rows.len(), "using external regressor rows");
                Some(parse_regressors(rows)?)
            }
            _ => None,
        };

        let history: Vec<SalesObservation> = req.history.iter().map(Into::into).collect();
        let base = self
            .model
            .forecast(&history, req.horizon, covariates.as_ref())
            .map_err(|e| log_internal("forecast", e))?;

        let scenario = req.scenario.as_deref().map(Scenario::parse).unwrap_or_default();
        let forecast = scenario::adjust(&base, &scenario);
        Ok(ForecastResponse { scenario, forecast })
    }

    pub fn demand(&self, req: DemandRequest) -> Result<DemandResponse, RequestError> {
        info!(product_id = %req.product_id, points = req.history.len(), "predicting demand");
        if req.history.is_empty() {
            return Err(bad_request("no historical data provided"));
        }
        check_horizon(req.days)?;

        let history: Vec<SalesObservation> = req.history.iter().map(Into::into).collect();
        let base = self
            .model
            .forecast(&history, req.days, None)
            .map_err(|e| log_internal("demand", e))?;

        Ok(DemandResponse {
            product_id: req.product_id,
            forecast: base.points().to_vec(),
        })
    }

    pub fn risk(&self, req: RiskRequest) -> Result<RiskResponse, RequestError> {
        require_finite(&[
            ("stock", req.stock),
            ("avg_daily_sales", req.avg_daily_sales),
            ("product_cost", req.product_cost),
        ])?;
        if req.stock < 0.0 {
            return Err(bad_request("stock must be non-negative"));
        }

        let a = RiskEngine::assess(req.stock, req.days_to_expiry, req.avg_daily_sales, req.product_cost);
        Ok(RiskResponse {
            product_id: req.product_id,
            expiration_risk_score: a.expiration_risk_score,
            waste_risk_score: a.waste_risk_score,
            days_of_inventory: a.days_of_inventory,
        })
    }

    pub fn purchase(&self, req: PurchaseRequest) -> Result<PurchaseResponse, RequestError> {
        require_finite(&[
            ("current_stock", req.current_stock),
            ("min_stock", req.min_stock),
            ("max_stock", req.max_stock),
            ("predicted_demand_next_7d", req.predicted_demand_next_7d),
        ])?;
        if req.min_stock < 0.0 || req.predicted_demand_next_7d < 0.0 {
            return Err(bad_request("min_stock and predicted_demand_next_7d must be non-negative"));
        }
        if req.max_stock < req.min_stock {
            return Err(bad_request("max_stock must not be below min_stock"));
        }

        let policy = StockPolicy {
            min_stock: req.min_stock,
            max_stock: req.max_stock,
        };
        let r = PurchaseAdvisor::recommend(req.current_stock, policy, req.predicted_demand_next_7d);
        Ok(PurchaseResponse {
            product_id: req.product_id,
            recommended_purchase_qty: r.recommended_purchase_qty,
            reason: r.reason,
            projected_stock_7d: r.projected_stock_7d,
        })
    }
}

fn check_horizon(horizon: usize) -> Result<(), RequestError> {
    if (1..=MAX_HORIZON).contains(&horizon) {
        Ok(())
    } else {
        Err(bad_request(format!("horizon must be between 1 and {MAX_HORIZON}, got {horizon}")))
    }
}

fn require_finite(fields: &[(&str, f64)]) -> Result<(), RequestError> {
    match fields.iter().find(|(_, v)| !v.is_finite()) {
        Some((name, _)) => Err(bad_request(format!("{name} must be a finite number"))),
        None => Ok(()),
    }
}

fn log_internal(endpoint: &'static str, e: ForecastError) -> RequestError {
    let mapped = RequestError::from(e);
    if let RequestError::Internal(msg) = &mapped {
        error!(endpoint, error = %msg, "forecast failed");
    }
    mapped
}

/// Build a covariate table from loosely typed regressor rows.
///
/// Booleans become 0/1; nulls are treated as missing.
pub fn parse_regressors(rows: &[Map<String, Value>]) -> Result<CovariateTable, RequestError> {
    let mut table = CovariateTable::new();
    for (i, row) in rows.iter().enumerate() {
        let date = row
            .get("date")
            .and_then(Value::as_str)
            .ok_or_else(|| bad_request(format!("regressor row {i} is missing a date")))?;
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|e| bad_request(format!("regressor row {i} has invalid date {date:?}: {e}")))?;

        for (column, value) in row.iter().filter(|(k, _)| k.as_str() != "date") {
            let v = match value {
                Value::Null => continue,
                Value::Bool(b) => f64::from(u8::from(*b)),
                Value::Number(n) => n
                    .as_f64()
                    .ok_or_else(|| bad_request(format!("regressor {column} on {date} is out of range")))?,
                _ => return Err(bad_request(format!("regressor {column} on {date} must be numeric"))),
            };
            table.insert(date, column.as_str(), v);
        }
    }
    Ok(table)
}
