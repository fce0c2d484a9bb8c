//! `demandcast-forecast`
//!
//! **Responsibility:** the pure forecasting engine.
//!
//! - Fits a seasonal model to sales history, falling back through an ordered
//!   strategy ladder when the model cannot be used.
//! - Applies scenario multipliers as post-processing.
//! - Scores expiration/waste risk and recommends purchase quantities.
//!
//! No I/O happens here: history, covariates and catalog data are supplied by
//! callers (infra/workers).

pub mod covariates;
pub mod demand;
pub mod job;
pub mod model;
pub mod purchase;
mod regression;
pub mod request;
pub mod result;
pub mod risk;
pub mod scenario;
pub mod scheduler;
pub mod strategy;

pub use covariates::{CovariateTable, ExogenousMatrix, IS_HOLIDAY, RegressorRecord, TEMP_MAX};
pub use demand::{BaseForecast, DemandModel};
pub use job::{ForecastJob, ProductForecastJob};
pub use model::{HoltWintersModel, ModelOutput, SeasonalModel};
pub use purchase::{PurchaseAdvisor, PurchaseRecommendation, StockPolicy};
pub use request::{
    DemandRequest, DemandResponse, ForecastEndpoints, ForecastRequest, ForecastResponse, HistoryPoint,
    PurchaseRequest, PurchaseResponse, RequestError, RiskRequest, RiskResponse,
};
pub use result::{ForecastError, ModelFitError};
pub use risk::{RiskAssessment, RiskEngine};
pub use scenario::ScenarioAdjuster;
pub use scheduler::{ForecastScheduler, LocalForecastScheduler, TenantScope};
pub use strategy::{ForecastInput, ForecastStrategy, HeuristicStrategy, StatisticalStrategy};
