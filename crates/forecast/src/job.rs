use std::sync::Arc;

use demandcast_core::{ForecastRow, ProductId, SalesObservation, Scenario, TenantId};

use crate::covariates::CovariateTable;
use crate::demand::DemandModel;
use crate::result::ForecastError;
use crate::scenario;

/// A tenant-scoped forecasting unit.
///
/// Jobs carry their own input snapshot; callers (infra/workers) are
/// responsible for loading it. Running a job never touches storage.
pub trait ForecastJob: Send + Sync + 'static {
    /// The tenant this job belongs to.
    fn tenant_id(&self) -> TenantId;

    fn run(&self, model: &DemandModel) -> Result<Vec<ForecastRow>, ForecastError>;
}

/// Forecast one product and expand the result into one row set per scenario.
#[derive(Debug, Clone)]
pub struct ProductForecastJob {
    pub tenant_id: TenantId,
    pub product_id: ProductId,
    pub history: Vec<SalesObservation>,
    pub horizon: usize,
    pub covariates: Option<Arc<CovariateTable>>,
    pub scenarios: Vec<Scenario>,
}

impl ProductForecastJob {
    pub fn new(tenant_id: TenantId, product_id: ProductId, history: Vec<SalesObservation>, horizon: usize) -> Self {
        Self {
            tenant_id,
            product_id,
            history,
            horizon,
            covariates: None,
            scenarios: Scenario::STANDARD.to_vec(),
        }
    }

    pub fn with_covariates(mut self, covariates: Arc<CovariateTable>) -> Self {
        self.covariates = Some(covariates);
        self
    }

    pub fn with_scenarios(mut self, scenarios: Vec<Scenario>) -> Self {
        self.scenarios = scenarios;
        self
    }
}

impl ForecastJob for ProductForecastJob {
    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    fn run(&self, model: &DemandModel) -> Result<Vec<ForecastRow>, ForecastError> {
        // The base forecast is fitted once; scenarios are pure post-processing.
        let base = model.forecast(&self.history, self.horizon, self.covariates.as_deref())?;

        let mut rows = Vec::with_capacity(base.len() * self.scenarios.len());
        for s in &self.scenarios {
            rows.extend(
                scenario::adjust(&base, s)
                    .into_iter()
                    .map(|p| ForecastRow::from_point(self.tenant_id, self.product_id, p)),
            );
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{Duration, NaiveDate};
    use demandcast_core::FixedClock;

    fn model() -> DemandModel {
        DemandModel::default().with_clock(Arc::new(FixedClock(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap())))
    }

    fn history(days: i64) -> Vec<SalesObservation> {
        let end = NaiveDate::from_ymd_opt(2024, 6, 29).unwrap();
        (0..days)
            .map(|i| SalesObservation::new(end - Duration::days(days - 1 - i), 10.0 + (i % 3) as f64))
            .collect()
    }

    #[test]
    fn emits_one_row_per_day_per_scenario() {
        let job = ProductForecastJob::new(TenantId::new(), ProductId::new(), history(10), 7);
        let rows = job.run(&model()).unwrap();

        assert_eq!(rows.len(), 21);
        for s in Scenario::STANDARD {
            assert_eq!(rows.iter().filter(|r| r.scenario == s).count(), 7);
        }
        assert!(rows.iter().all(|r| r.tenant_id == job.tenant_id && r.product_id == job.product_id));
    }

    #[test]
    fn keys_are_unique() {
        let job = ProductForecastJob::new(TenantId::new(), ProductId::new(), history(40), 14);
        let rows = job.run(&model()).unwrap();

        let mut keys: Vec<_> = rows.iter().map(ForecastRow::key).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), rows.len());
    }

    #[test]
    fn no_history_yields_no_rows() {
        let job = ProductForecastJob::new(TenantId::new(), ProductId::new(), Vec::new(), 7);
        assert!(job.run(&model()).unwrap().is_empty());
    }

    #[test]
    fn custom_scenario_list_is_respected() {
        let job = ProductForecastJob::new(TenantId::new(), ProductId::new(), history(10), 3)
            .with_scenarios(vec![Scenario::Crisis]);
        let rows = job.run(&model()).unwrap();

        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.scenario == Scenario::Crisis));
    }
}
