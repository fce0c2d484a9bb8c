//! Scenario post-processing.

use demandcast_core::{ForecastPoint, Scenario, round_to};

use crate::demand::BaseForecast;

/// Applies scenario multipliers to base forecasts.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScenarioAdjuster;

impl ScenarioAdjuster {
    pub fn adjust(&self, base: &BaseForecast, scenario: &Scenario) -> Vec<ForecastPoint> {
        adjust(base, scenario)
    }
}

/// Scale a base forecast by the scenario multiplier and tag every point.
///
/// Point, lower and upper bounds share the factor, so the relative band width
/// is preserved. Input is always the base forecast: applying the same scenario
/// twice yields the same points.
pub fn adjust(base: &BaseForecast, scenario: &Scenario) -> Vec<ForecastPoint> {
    let m = scenario.multiplier();
    base.points()
        .iter()
        .map(|p| ForecastPoint {
            date: p.date,
            predicted_demand: round_to(p.predicted_demand * m, 2),
            confidence_lower: round_to(p.confidence_lower * m, 2),
            confidence_upper: round_to(p.confidence_upper * m, 2),
            scenario: scenario.clone(),
            model_version: p.model_version.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::{Duration, NaiveDate};
    use demandcast_core::{FixedClock, SalesObservation};
    use proptest::prelude::*;

    use crate::demand::DemandModel;

    fn base_from(values: &[f64]) -> BaseForecast {
        let today = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        let history: Vec<SalesObservation> = values
            .iter()
            .enumerate()
            .map(|(i, v)| SalesObservation::new(today - Duration::days(values.len() as i64 - i as i64), *v))
            .collect();
        DemandModel::default()
            .with_clock(Arc::new(FixedClock(today)))
            .forecast(&history, 7, None)
            .unwrap()
    }

    #[test]
    fn base_scenario_is_identity() {
        let base = base_from(&[10.0, 12.0, 9.0]);
        let adjusted = adjust(&base, &Scenario::Base);
        assert_eq!(adjusted, base.points());
    }

    #[test]
    fn crisis_scales_point_and_band() {
        let base = base_from(&[20.0, 20.0, 20.0]);
        let adjusted = adjust(&base, &Scenario::Crisis);

        for (a, b) in adjusted.iter().zip(base.points()) {
            assert_eq!(a.predicted_demand, round_to(b.predicted_demand * 0.65, 2));
            assert_eq!(a.confidence_upper, round_to(b.confidence_upper * 0.65, 2));
            assert_eq!(a.scenario, Scenario::Crisis);
        }
    }

    #[test]
    fn unknown_scenario_keeps_values_and_tag() {
        let base = base_from(&[7.0, 8.0]);
        let s = Scenario::parse("black-friday");
        let adjusted = adjust(&base, &s);

        assert_eq!(adjusted[0].predicted_demand, base.points()[0].predicted_demand);
        assert_eq!(adjusted[0].scenario.as_str(), "black-friday");
    }

    #[test]
    fn repeated_adjustment_does_not_compound() {
        let base = base_from(&[30.0, 40.0, 35.0]);
        let once = adjust(&base, &Scenario::Optimistic);
        let twice = ScenarioAdjuster.adjust(&base, &Scenario::Optimistic);
        assert_eq!(once, twice);
    }

    proptest! {
        /// Property: optimistic points equal round(base × 1.25, 2), bounds stay ordered.
        #[test]
        fn optimistic_scales_by_one_and_a_quarter(
            values in prop::collection::vec(0.0f64..1_000.0, 1..40),
        ) {
            let base = base_from(&values);
            let adjusted = adjust(&base, &Scenario::Optimistic);

            for (a, b) in adjusted.iter().zip(base.points()) {
                prop_assert_eq!(a.predicted_demand, round_to(b.predicted_demand * 1.25, 2));
                prop_assert!(a.confidence_lower <= a.predicted_demand);
                prop_assert!(a.predicted_demand <= a.confidence_upper);
            }
        }
    }
}
