//! Demand model: validated history in, base forecast out.

use std::sync::Arc;

use tracing::{debug, warn};

use demandcast_core::{Clock, ForecastPoint, SalesObservation, SystemClock};

use crate::covariates::CovariateTable;
use crate::model::{HoltWintersModel, SeasonalModel};
use crate::result::{ForecastError, ModelFitError};
use crate::strategy::{ForecastInput, ForecastStrategy, HeuristicStrategy, StatisticalStrategy};

/// Unadjusted forecast produced by the fallback ladder (scenario `base`).
///
/// Scenario variants are always derived from this value, never from each
/// other, so adjustments cannot compound.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BaseForecast {
    points: Vec<ForecastPoint>,
    strategy: Option<String>,
}

impl BaseForecast {
    pub fn points(&self) -> &[ForecastPoint] {
        &self.points
    }

    /// Name of the strategy that produced the points (`None` when empty).
    pub fn strategy(&self) -> Option<&str> {
        self.strategy.as_deref()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Forecasting engine that tries each strategy in order.
///
/// Default ladder: statistical model, then heuristic. An empty history always
/// yields an empty forecast.
pub struct DemandModel {
    strategies: Vec<Box<dyn ForecastStrategy>>,
    clock: Arc<dyn Clock>,
}

impl Default for DemandModel {
    fn default() -> Self {
        Self::new(HoltWintersModel::default())
    }
}

impl DemandModel {
    pub fn new<M: SeasonalModel + 'static>(model: M) -> Self {
        Self::from_strategies(vec![
            Box::new(StatisticalStrategy::new(model)),
            Box::new(HeuristicStrategy),
        ])
    }

    pub fn from_strategies(strategies: Vec<Box<dyn ForecastStrategy>>) -> Self {
        Self {
            strategies,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Forecast `horizon` days from `history`.
    ///
    /// History may arrive unsorted; duplicate dates and negative or non-finite
    /// quantities are rejected as invalid input.
    pub fn forecast(
        &self,
        history: &[SalesObservation],
        horizon: usize,
        covariates: Option<&CovariateTable>,
    ) -> Result<BaseForecast, ForecastError> {
        let history = prepare_history(history)?;
        if history.is_empty() || horizon == 0 {
            return Ok(BaseForecast::default());
        }

        let input = ForecastInput {
            history: &history,
            horizon,
            covariates,
            today: self.clock.today(),
        };

        let mut last_error = None;
        for strategy in &self.strategies {
            match strategy.attempt(&input) {
                Ok(points) => {
                    debug!(strategy = strategy.name(), points = points.len(), "forecast produced");
                    return Ok(BaseForecast {
                        points,
                        strategy: Some(strategy.name().to_string()),
                    });
                }
                Err(e) if e.is_recoverable() => {
                    match &e {
                        ForecastError::ModelFit(fit) if !matches!(fit, ModelFitError::InsufficientSeasons { .. }) => {
                            warn!(strategy = strategy.name(), error = %fit, "model failed; falling back")
                        }
                        other => {
                            debug!(strategy = strategy.name(), reason = %other, "strategy declined")
                        }
                    }
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| ForecastError::Internal("no forecasting strategy configured".into())))
    }
}

fn prepare_history(history: &[SalesObservation]) -> Result<Vec<SalesObservation>, ForecastError> {
    if let Some(bad) = history
        .iter()
        .find(|o| !o.quantity.is_finite() || o.quantity < 0.0)
    {
        return Err(ForecastError::InvalidInput(format!(
            "quantity on {} must be a non-negative number, got {}",
            bad.date, bad.quantity
        )));
    }

    let mut sorted = history.to_vec();
    sorted.sort_by_key(|o| o.date);
    if let Some(w) = sorted.windows(2).find(|w| w[0].date == w[1].date) {
        return Err(ForecastError::InvalidInput(format!(
            "duplicate observation for {}",
            w[0].date
        )));
    }
    Ok(sorted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Duration, NaiveDate, Weekday};
    use demandcast_core::FixedClock;
    use proptest::prelude::*;

    use crate::model::ModelOutput;
    use crate::strategy::HEURISTIC_MODEL_VERSION;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    }

    fn model() -> DemandModel {
        DemandModel::default().with_clock(Arc::new(FixedClock(today())))
    }

    fn history_ending_yesterday(values: &[f64]) -> Vec<SalesObservation> {
        let n = values.len() as i64;
        values
            .iter()
            .enumerate()
            .map(|(i, v)| SalesObservation::new(today() - Duration::days(n - i as i64), *v))
            .collect()
    }

    /// Always fails, to exercise the fallback path.
    struct BrokenModel;

    impl SeasonalModel for BrokenModel {
        fn name(&self) -> &str {
            "broken"
        }

        fn fit_predict(
            &self,
            _history: &[SalesObservation],
            _future_dates: &[NaiveDate],
            _exogenous: Option<&crate::covariates::ExogenousMatrix>,
        ) -> Result<ModelOutput, ModelFitError> {
            Err(ModelFitError::SingularDesign)
        }
    }

    #[test]
    fn empty_history_yields_empty_forecast() {
        let f = model().forecast(&[], 7, None).unwrap();
        assert!(f.is_empty());
        assert_eq!(f.strategy(), None);
    }

    #[test]
    fn short_history_uses_heuristic_from_today() {
        let history = history_ending_yesterday(&[4.0, 6.0, 5.0]);
        let f = model().forecast(&history, 5, None).unwrap();

        assert_eq!(f.strategy(), Some("heuristic"));
        assert_eq!(f.len(), 5);
        for (i, p) in f.points().iter().enumerate() {
            assert_eq!(p.date, today() + Duration::days(i as i64 + 1));
            assert_eq!(p.model_version, HEURISTIC_MODEL_VERSION);
        }
    }

    #[test]
    fn default_ladder_is_statistical_then_heuristic() {
        assert_eq!(model().strategy_names(), vec!["statistical", "heuristic"]);
    }

    #[test]
    fn history_below_two_seasons_uses_heuristic() {
        let values = [12.0, 18.0, 9.0, 14.0, 21.0, 11.0, 16.0, 13.0, 19.0, 10.0];
        let history = history_ending_yesterday(&values);
        let f = model().forecast(&history, 4, None).unwrap();

        assert_eq!(f.strategy(), Some("heuristic"));
        assert_eq!(f.points()[0].date, today() + Duration::days(1));
        assert!(f.points().iter().all(|p| p.model_version == HEURISTIC_MODEL_VERSION));
        // 0.7 * 14.3 + 0.3 * 10 = 13.01 on Monday 2024-07-01.
        assert_eq!(f.points()[0].predicted_demand, 13.01);
    }

    #[test]
    fn covariates_drive_the_statistical_forecast() {
        let temp = |date: NaiveDate| 15.0 + f64::from(date.num_days_from_ce().rem_euclid(11));
        let values: Vec<f64> = (1..=42)
            .rev()
            .map(|back| 20.0 + 2.0 * temp(today() - Duration::days(back)))
            .collect();
        let history = history_ending_yesterday(&values);

        let mut table = CovariateTable::new();
        for back in -7..=42 {
            let date = today() - Duration::days(back);
            table.insert(date, "temp_max", temp(date));
        }

        let with = model().forecast(&history, 7, Some(&table)).unwrap();
        let without = model().forecast(&history, 7, None).unwrap();

        assert_eq!(with.strategy(), Some("statistical"));
        for p in with.points() {
            let expected = 20.0 + 2.0 * temp(p.date);
            assert!((p.predicted_demand - expected).abs() < 0.1, "{}: {}", p.date, p.predicted_demand);
        }
        assert!(
            without
                .points()
                .iter()
                .any(|p| (p.predicted_demand - (20.0 + 2.0 * temp(p.date))).abs() > 1.0)
        );
    }

    #[test]
    fn model_failure_falls_back_to_heuristic() {
        let history = history_ending_yesterday(&[10.0; 20]);
        let f = DemandModel::new(BrokenModel)
            .with_clock(Arc::new(FixedClock(today())))
            .forecast(&history, 3, None)
            .unwrap();

        assert_eq!(f.strategy(), Some("heuristic"));
        assert_eq!(f.len(), 3);
    }

    #[test]
    fn constant_history_degenerates_to_heuristic() {
        let history = history_ending_yesterday(&[12.0; 30]);
        let f = model().forecast(&history, 7, None).unwrap();
        assert_eq!(f.strategy(), Some("heuristic"));
    }

    #[test]
    fn statistical_forecast_continues_from_last_observation() {
        let values: Vec<f64> = (0..28).map(|i| 20.0 + (i % 7) as f64 * 3.0).collect();
        let history = history_ending_yesterday(&values);
        let f = model().forecast(&history, 7, None).unwrap();

        assert_eq!(f.strategy(), Some("statistical"));
        assert_eq!(f.points()[0].date, today());
        assert_eq!(f.points()[0].model_version, "v1.0-holt-winters");
    }

    #[test]
    fn weekly_pattern_elevates_weekend_forecasts() {
        let history: Vec<SalesObservation> = (1..=30)
            .rev()
            .map(|back| {
                let date = today() - Duration::days(back);
                let q = if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) { 75.0 } else { 50.0 };
                SalesObservation::new(date, q)
            })
            .collect();

        let f = model().forecast(&history, 7, None).unwrap();
        let weekend: Vec<f64> = f
            .points()
            .iter()
            .filter(|p| matches!(p.date.weekday(), Weekday::Sat | Weekday::Sun))
            .map(|p| p.predicted_demand)
            .collect();
        let weekday: Vec<f64> = f
            .points()
            .iter()
            .filter(|p| !matches!(p.date.weekday(), Weekday::Sat | Weekday::Sun))
            .map(|p| p.predicted_demand)
            .collect();

        assert_eq!(weekend.len(), 2);
        let min_weekend = weekend.iter().cloned().fold(f64::INFINITY, f64::min);
        let max_weekday = weekday.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        assert!(min_weekend > max_weekday);
    }

    #[test]
    fn duplicate_dates_are_invalid() {
        let d = today() - Duration::days(1);
        let history = vec![SalesObservation::new(d, 1.0), SalesObservation::new(d, 2.0)];
        let err = model().forecast(&history, 3, None).unwrap_err();
        assert!(matches!(err, ForecastError::InvalidInput(msg) if msg.contains("duplicate")));
    }

    #[test]
    fn negative_quantities_are_invalid() {
        let history = history_ending_yesterday(&[3.0, -1.0]);
        assert!(matches!(
            model().forecast(&history, 3, None),
            Err(ForecastError::InvalidInput(_))
        ));
    }

    #[test]
    fn unsorted_history_is_accepted() {
        let mut history = history_ending_yesterday(&[1.0, 2.0, 3.0]);
        history.reverse();
        let f = model().forecast(&history, 2, None).unwrap();
        // Forecast days are Mon/Tue; last observed value is 3.0 once sorted.
        assert!(f.points().iter().all(|p| p.predicted_demand == 2.3));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        /// Property: any valid history yields `horizon` well-formed points.
        #[test]
        fn forecasts_are_non_negative_and_bracketed(
            values in prop::collection::vec(0.0f64..500.0, 1..60),
            horizon in 1usize..21,
        ) {
            let history = history_ending_yesterday(&values);
            let f = model().forecast(&history, horizon, None).unwrap();

            prop_assert_eq!(f.len(), horizon);
            for p in f.points() {
                prop_assert!(p.is_well_formed(), "{:?}", p);
            }
            for w in f.points().windows(2) {
                prop_assert_eq!(w[1].date, w[0].date + Duration::days(1));
            }
        }

        /// Property: short histories always take the heuristic path anchored on today.
        #[test]
        fn short_histories_use_heuristic(
            values in prop::collection::vec(0.0f64..100.0, 1..5),
            horizon in 1usize..14,
        ) {
            let history = history_ending_yesterday(&values);
            let f = model().forecast(&history, horizon, None).unwrap();

            prop_assert_eq!(f.strategy(), Some("heuristic"));
            prop_assert_eq!(f.points()[0].date, today() + Duration::days(1));
        }
    }
}
