//! Synthetic sales history for demos and tests.
//!
//! Never enabled implicitly: the orchestrator only consults it when
//! `SyncConfig::synthesize_missing_history` is set.

use std::sync::Mutex;

use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use demandcast_core::SalesObservation;

pub struct SyntheticHistory {
    rng: Mutex<StdRng>,
    days: i64,
}

impl SyntheticHistory {
    pub const DEFAULT_DAYS: i64 = 30;

    /// Seeded generator; identical seeds give identical histories.
    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    pub fn from_seed_option(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_entropy, Self::seeded)
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            rng: Mutex::new(rng),
            days: Self::DEFAULT_DAYS,
        }
    }

    /// Daily observations for the `days` days before `today`.
    ///
    /// Each series gets a base level in [10, 30); daily quantity is
    /// `max(0, base + U(-5, 10))`.
    pub fn generate(&self, today: NaiveDate) -> Vec<SalesObservation> {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let base: f64 = 10.0 + rng.gen_range(0.0..20.0);

        (0..self.days)
            .map(|i| {
                let date = today - Duration::days(self.days - i);
                let quantity = (base + rng.gen_range(-5.0..10.0)).max(0.0);
                SalesObservation::new(date, quantity)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    }

    #[test]
    fn thirty_days_ending_yesterday() {
        let history = SyntheticHistory::seeded(7).generate(today());

        assert_eq!(history.len(), 30);
        assert_eq!(history[0].date, NaiveDate::from_ymd_opt(2024, 5, 31).unwrap());
        assert_eq!(history[29].date, NaiveDate::from_ymd_opt(2024, 6, 29).unwrap());
        assert!(history.windows(2).all(|w| w[1].date - w[0].date == Duration::days(1)));
    }

    #[test]
    fn quantities_stay_in_range() {
        let history = SyntheticHistory::seeded(1).generate(today());
        assert!(history.iter().all(|o| (0.0..40.0).contains(&o.quantity)));
    }

    #[test]
    fn same_seed_same_history() {
        let a = SyntheticHistory::seeded(99).generate(today());
        let b = SyntheticHistory::seeded(99).generate(today());
        assert_eq!(a, b);
    }
}
