//! Ordered forecasting strategies.
//!
//! Each strategy either produces a full forecast or reports why it declined;
//! `DemandModel` walks the list in order and advances only on a recoverable
//! failure.

use chrono::{Datelike, Days, NaiveDate, Weekday};

use demandcast_core::{ForecastPoint, SalesObservation, Scenario, round_to};

use crate::covariates::CovariateTable;
use crate::model::SeasonalModel;
use crate::regression::mean;
use crate::result::ForecastError;

/// Minimum number of observations before the statistical model is attempted.
pub const MIN_OBSERVATIONS: usize = 5;

/// Version tag of heuristic output.
pub const HEURISTIC_MODEL_VERSION: &str = "v1.0-heuristic";

/// Validated inputs shared by every strategy.
#[derive(Debug, Clone, Copy)]
pub struct ForecastInput<'a> {
    /// Sorted by date, unique dates, non-negative quantities.
    pub history: &'a [SalesObservation],
    pub horizon: usize,
    pub covariates: Option<&'a CovariateTable>,
    pub today: NaiveDate,
}

pub trait ForecastStrategy: Send + Sync {
    fn name(&self) -> &str;

    fn attempt(&self, input: &ForecastInput<'_>) -> Result<Vec<ForecastPoint>, ForecastError>;
}

/// Primary rung: seasonal statistical model, optionally with covariates.
///
/// Dates continue from the last observed date.
pub struct StatisticalStrategy<M> {
    model: M,
}

impl<M: SeasonalModel> StatisticalStrategy<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }
}

impl<M: SeasonalModel> ForecastStrategy for StatisticalStrategy<M> {
    fn name(&self) -> &str {
        "statistical"
    }

    fn attempt(&self, input: &ForecastInput<'_>) -> Result<Vec<ForecastPoint>, ForecastError> {
        if input.history.len() < MIN_OBSERVATIONS {
            return Err(ForecastError::DataInsufficient {
                required: MIN_OBSERVATIONS,
                found: input.history.len(),
            });
        }
        let Some(last) = input.history.last() else {
            return Err(ForecastError::EmptyHistory);
        };

        let future_dates = consecutive_days(last.date, input.horizon)?;
        let history_dates: Vec<NaiveDate> = input.history.iter().map(|o| o.date).collect();
        let exogenous = input
            .covariates
            .filter(|c| !c.is_empty())
            .map(|c| c.exogenous(&history_dates, &future_dates));

        let out = self
            .model
            .fit_predict(input.history, &future_dates, exogenous.as_ref())?;

        Ok(future_dates
            .iter()
            .enumerate()
            .map(|(i, date)| {
                finalize_point(*date, out.mean[i], out.lower[i], out.upper[i], self.model.name())
            })
            .collect())
    }
}

/// Closed-form fallback: `0.7 × mean + 0.3 × last`, lifted 10% on weekends,
/// with a ±20% band. Dates continue from `today`.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicStrategy;

impl HeuristicStrategy {
    pub const MEAN_WEIGHT: f64 = 0.7;
    pub const LAST_WEIGHT: f64 = 0.3;
    pub const WEEKEND_LIFT: f64 = 1.1;
    pub const BAND: (f64, f64) = (0.8, 1.2);

    /// Point estimate for `date` given the history baseline.
    pub fn point(baseline: f64, date: NaiveDate) -> f64 {
        if is_weekend(date) {
            baseline * Self::WEEKEND_LIFT
        } else {
            baseline
        }
    }
}

impl ForecastStrategy for HeuristicStrategy {
    fn name(&self) -> &str {
        "heuristic"
    }

    fn attempt(&self, input: &ForecastInput<'_>) -> Result<Vec<ForecastPoint>, ForecastError> {
        let Some(last) = input.history.last() else {
            return Err(ForecastError::EmptyHistory);
        };
        let values: Vec<f64> = input.history.iter().map(|o| o.quantity).collect();
        let baseline = Self::MEAN_WEIGHT * mean(&values) + Self::LAST_WEIGHT * last.quantity;

        Ok(consecutive_days(input.today, input.horizon)?
            .into_iter()
            .map(|date| {
                let p = Self::point(baseline, date);
                finalize_point(date, p, p * Self::BAND.0, p * Self::BAND.1, HEURISTIC_MODEL_VERSION)
            })
            .collect())
    }
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// `horizon` consecutive days strictly after `anchor`.
///
/// Fails when the range would run past the last representable date.
pub fn consecutive_days(anchor: NaiveDate, horizon: usize) -> Result<Vec<NaiveDate>, ForecastError> {
    (1..=horizon as u64)
        .map(|i| {
            anchor.checked_add_days(Days::new(i)).ok_or_else(|| {
                ForecastError::InvalidInput(format!("{horizon} days after {anchor} is out of the calendar range"))
            })
        })
        .collect()
}

/// Round to cents, floor at zero and restore `lower <= point <= upper`.
fn finalize_point(date: NaiveDate, point: f64, lower: f64, upper: f64, version: &str) -> ForecastPoint {
    let predicted = round_to(point, 2).max(0.0);
    let lower = round_to(lower, 2).max(0.0).min(predicted);
    let upper = round_to(upper, 2).max(0.0).max(predicted);
    ForecastPoint {
        date,
        predicted_demand: predicted,
        confidence_lower: lower,
        confidence_upper: upper,
        scenario: Scenario::Base,
        model_version: version.to_string(),
    }
}
