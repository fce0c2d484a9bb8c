//! Statistical demand model contract and the default seasonal implementation.

use chrono::{Datelike, NaiveDate};

use demandcast_core::SalesObservation;

use crate::covariates::ExogenousMatrix;
use crate::regression::{mean, ridge_fit};
use crate::result::ModelFitError;

/// Raw model output for the requested future dates (unrounded, unclamped).
#[derive(Debug, Clone, PartialEq)]
pub struct ModelOutput {
    pub mean: Vec<f64>,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

/// Pluggable statistical model: `fit(history, covariates) → point + interval`.
///
/// `history` is sorted by date with unique dates. When `exogenous` is given its
/// `history` rows align with `history` and its `future` rows with
/// `future_dates`.
pub trait SeasonalModel: Send + Sync {
    /// Version tag stamped on every forecast point this model produces.
    fn name(&self) -> &str;

    fn fit_predict(
        &self,
        history: &[SalesObservation],
        future_dates: &[NaiveDate],
        exogenous: Option<&ExogenousMatrix>,
    ) -> Result<ModelOutput, ModelFitError>;
}

const ALPHA_GRID: [f64; 5] = [0.1, 0.2, 0.3, 0.5, 0.8];
const BETA_GRID: [f64; 3] = [0.0, 0.05, 0.15];
const GAMMA_GRID: [f64; 3] = [0.05, 0.15, 0.3];

/// Additive Holt-Winters with a damped trend.
///
/// Exogenous regressors enter as a linear effect estimated by ridge regression
/// and removed before smoothing. Smoothing parameters are picked from a fixed
/// grid by one-step-ahead SSE, so fits are deterministic.
#[derive(Debug, Clone)]
pub struct HoltWintersModel {
    season_length: usize,
    damping: f64,
    /// Normal quantile of the two-sided prediction interval (80% ⇒ 1.2816).
    interval_z: f64,
    ridge_lambda: f64,
}

impl Default for HoltWintersModel {
    fn default() -> Self {
        Self {
            season_length: 7,
            damping: 0.98,
            interval_z: 1.2816,
            ridge_lambda: 1e-6,
        }
    }
}

#[derive(Debug, Clone)]
struct SmoothingState {
    level: f64,
    trend: f64,
    seasonal: Vec<f64>,
    alpha: f64,
    sse: f64,
}

impl HoltWintersModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_season_length(mut self, season_length: usize) -> Self {
        self.season_length = season_length.max(1);
        self
    }

    pub fn with_damping(mut self, damping: f64) -> Self {
        self.damping = damping.clamp(0.0, 1.0);
        self
    }

    pub fn with_interval_z(mut self, z: f64) -> Self {
        self.interval_z = z.max(0.0);
        self
    }

    pub fn season_length(&self) -> usize {
        self.season_length
    }

    fn slot(&self, date: NaiveDate) -> usize {
        date.num_days_from_ce().rem_euclid(self.season_length as i32) as usize
    }

    fn initial_seasonal(&self, dates: &[NaiveDate], y: &[f64]) -> Vec<f64> {
        let overall = mean(y);
        let mut sums = vec![0.0; self.season_length];
        let mut counts = vec![0usize; self.season_length];
        for (date, v) in dates.iter().zip(y) {
            let s = self.slot(*date);
            sums[s] += v;
            counts[s] += 1;
        }
        sums.iter()
            .zip(&counts)
            .map(|(s, c)| if *c == 0 { 0.0 } else { s / *c as f64 - overall })
            .collect()
    }

    fn smooth(&self, dates: &[NaiveDate], y: &[f64], alpha: f64, beta: f64, gamma: f64) -> SmoothingState {
        let m = self.season_length;
        let phi = self.damping;
        let mut seasonal = self.initial_seasonal(dates, y);

        let deseason: Vec<f64> = dates
            .iter()
            .zip(y)
            .map(|(d, v)| v - seasonal[self.slot(*d)])
            .collect();
        let mut level = mean(&deseason[..m]);
        let mut trend = (mean(&deseason[m..2 * m]) - level) / m as f64;

        let mut sse = 0.0;
        for (date, obs) in dates.iter().zip(y) {
            let s = self.slot(*date);
            let predicted = level + phi * trend + seasonal[s];
            let err = obs - predicted;
            sse += err * err;

            let new_level = alpha * (obs - seasonal[s]) + (1.0 - alpha) * (level + phi * trend);
            trend = beta * (new_level - level) + (1.0 - beta) * phi * trend;
            seasonal[s] = gamma * (obs - new_level) + (1.0 - gamma) * seasonal[s];
            level = new_level;
        }

        SmoothingState {
            level,
            trend,
            seasonal,
            alpha,
            sse,
        }
    }
}

impl SeasonalModel for HoltWintersModel {
    fn name(&self) -> &str {
        "v1.0-holt-winters"
    }

    fn fit_predict(
        &self,
        history: &[SalesObservation],
        future_dates: &[NaiveDate],
        exogenous: Option<&ExogenousMatrix>,
    ) -> Result<ModelOutput, ModelFitError> {
        let required = 2 * self.season_length;
        if history.len() < required {
            return Err(ModelFitError::InsufficientSeasons {
                required,
                found: history.len(),
            });
        }

        let dates: Vec<NaiveDate> = history.iter().map(|o| o.date).collect();
        let mut y: Vec<f64> = history.iter().map(|o| o.quantity).collect();

        let mut future_effect = vec![0.0; future_dates.len()];
        if let Some(ex) = exogenous.filter(|ex| !ex.columns.is_empty()) {
            if ex.future.len() != future_dates.len() {
                return Err(ModelFitError::MisalignedCovariates(format!(
                    "{} future regressor rows for {} forecast dates",
                    ex.future.len(),
                    future_dates.len()
                )));
            }
            let fit = ridge_fit(&ex.history, &y, self.ridge_lambda)?;
            for (v, row) in y.iter_mut().zip(&ex.history) {
                *v -= fit.effect(row);
            }
            for (e, row) in future_effect.iter_mut().zip(&ex.future) {
                *e = fit.effect(row);
            }
        }

        let mut best: Option<SmoothingState> = None;
        for alpha in ALPHA_GRID {
            for beta in BETA_GRID {
                for gamma in GAMMA_GRID {
                    let state = self.smooth(&dates, &y, alpha, beta, gamma);
                    if best.as_ref().is_none_or(|b| state.sse < b.sse) {
                        best = Some(state);
                    }
                }
            }
        }
        let state = best.ok_or(ModelFitError::NonFinite)?;

        let sigma = (state.sse / (y.len() - 1) as f64).sqrt();
        let mut out = ModelOutput {
            mean: Vec::with_capacity(future_dates.len()),
            lower: Vec::with_capacity(future_dates.len()),
            upper: Vec::with_capacity(future_dates.len()),
        };

        let mut damp_sum = 0.0;
        let mut damp_pow = 1.0;
        for (h, (date, effect)) in future_dates.iter().zip(&future_effect).enumerate() {
            damp_pow *= self.damping;
            damp_sum += damp_pow;
            let point = state.level + damp_sum * state.trend + state.seasonal[self.slot(*date)] + effect;
            let half_width =
                self.interval_z * sigma * (1.0 + h as f64 * state.alpha * state.alpha).sqrt();

            out.mean.push(point);
            out.lower.push(point - half_width);
            out.upper.push(point + half_width);
        }

        if out
            .mean
            .iter()
            .chain(&out.lower)
            .chain(&out.upper)
            .any(|v| !v.is_finite())
        {
            return Err(ModelFitError::NonFinite);
        }

        let (lo, hi) = out
            .mean
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
        if out.mean.len() > 1 && hi - lo < 1e-9 {
            return Err(ModelFitError::Degenerate);
        }

        Ok(out)
    }
}
