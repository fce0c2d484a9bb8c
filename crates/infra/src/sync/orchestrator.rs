//! Batch driver: catalog → history → per-product forecasts → one bulk upsert.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use chrono::{Days, NaiveDate};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use demandcast_core::{Clock, ForecastRow, Product, ProductId, SalesObservation, SalesRecord, SystemClock};
use demandcast_forecast::strategy::MIN_OBSERVATIONS;
use demandcast_forecast::{
    CovariateTable, DemandModel, ForecastScheduler, LocalForecastScheduler, ProductForecastJob, TenantScope,
};

use super::cancel::CancelSignal;
use super::report::{SyncReport, SyncStatus};
use crate::catalog::ProductCatalog;
use crate::config::SyncConfig;
use crate::error::StoreError;
use crate::external::RegressorProvider;
use crate::forecast_store::PersistenceStore;
use crate::sales::{SalesSource, SyntheticHistory};

/// Runs forecast synchronization over every active product in scope.
///
/// - Products fail independently: a forecasting error excludes that product only.
/// - Persistence is all-or-nothing: one upsert per run, after all products.
/// - Cancellation is checked before each product and before persisting;
///   a cancelled run persists nothing.
pub struct SyncOrchestrator {
    catalog: Arc<dyn ProductCatalog>,
    sales: Arc<dyn SalesSource>,
    store: Arc<dyn PersistenceStore>,
    regressors: Option<Arc<RegressorProvider>>,
    model: Option<Arc<DemandModel>>,
    synthetic: Option<SyntheticHistory>,
    clock: Arc<dyn Clock>,
    config: SyncConfig,
}

impl SyncOrchestrator {
    pub fn new(
        catalog: Arc<dyn ProductCatalog>,
        sales: Arc<dyn SalesSource>,
        store: Arc<dyn PersistenceStore>,
        config: SyncConfig,
    ) -> Self {
        let synthetic = config
            .synthesize_missing_history
            .then(|| SyntheticHistory::from_seed_option(config.synthetic_seed));

        Self {
            catalog,
            sales,
            store,
            regressors: None,
            model: None,
            synthetic,
            clock: Arc::new(SystemClock),
            config,
        }
    }

    pub fn with_regressors(mut self, provider: Arc<RegressorProvider>) -> Self {
        self.regressors = Some(provider);
        self
    }

    /// Replace the default demand model (which follows this orchestrator's clock).
    pub fn with_model(mut self, model: Arc<DemandModel>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub async fn run(&self) -> SyncReport {
        self.run_with_cancel(&CancelSignal::never()).await
    }

    pub async fn run_with_cancel(&self, cancel: &CancelSignal) -> SyncReport {
        let today = self.clock.today();
        let scope = TenantScope::from(self.config.tenant);
        let report = SyncReport::new(SyncStatus::Success);

        info!(
            %today,
            horizon = self.config.horizon_days,
            history_days = self.config.history_days,
            scope = ?scope,
            "starting forecast synchronization"
        );

        if cancel.is_cancelled() {
            return cancelled(report);
        }

        let products = match self.call("list_active_products", self.catalog.list_active()).await {
            Ok(products) => products,
            Err(e) => {
                error!(error = %e, "catalog unavailable; aborting sync");
                return report.with_reason(SyncStatus::Skipped, SyncReport::CATALOG_UNAVAILABLE);
            }
        };
        let products: Vec<Product> = products
            .into_iter()
            .filter(|p| p.is_active() && scope.allows(p.tenant_id))
            .collect();
        if products.is_empty() {
            warn!("no active products found; aborting sync");
            return report.with_reason(SyncStatus::Skipped, SyncReport::NO_PRODUCTS);
        }
        info!(products = products.len(), "active products found");

        let history = match self.call("recent_sales", self.sales.recent(self.config.history_days)).await {
            Ok(rows) => partition(rows),
            Err(e) => {
                warn!(error = %e, "sales history unavailable; continuing with none");
                BTreeMap::new()
            }
        };

        let covariates = self.fetch_covariates(today).await;
        self.forecast_and_persist(products, history, covariates, scope, today, cancel, report)
            .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn forecast_and_persist(
        &self,
        products: Vec<Product>,
        mut history: BTreeMap<ProductId, Vec<SalesObservation>>,
        covariates: Option<Arc<CovariateTable>>,
        scope: TenantScope,
        today: NaiveDate,
        cancel: &CancelSignal,
        mut report: SyncReport,
    ) -> SyncReport {
        report.products_considered = products.len();

        let model = self
            .model
            .clone()
            .unwrap_or_else(|| Arc::new(DemandModel::default().with_clock(self.clock.clone())));
        let scheduler = LocalForecastScheduler::new(scope, model);
        let permits = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));
        let mut tasks = JoinSet::new();

        for product in products {
            if cancel.is_cancelled() {
                tasks.shutdown().await;
                return cancelled(report);
            }

            let observations = self.history_for(&product, history.remove(&product.id), today);
            if observations.len() < MIN_OBSERVATIONS {
                info!(
                    tenant = %product.tenant_id,
                    product = %product.id,
                    observations = observations.len(),
                    "insufficient history; skipping product"
                );
                report.products_skipped += 1;
                continue;
            }

            let mut job =
                ProductForecastJob::new(product.tenant_id, product.id, observations, self.config.horizon_days);
            if let Some(c) = &covariates {
                job = job.with_covariates(c.clone());
            }

            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tasks.shutdown().await;
                    return cancelled(report);
                }
                permit = permits.clone().acquire_owned() => permit,
            };
            let Ok(permit) = permit else {
                error!(product = %product.id, "worker pool closed; product not forecast");
                report.products_failed += 1;
                continue;
            };

            let scheduler = scheduler.clone();
            tasks.spawn_blocking(move || {
                let _permit = permit;
                let rows = scheduler.run(&job);
                (job.tenant_id, job.product_id, rows)
            });
        }

        let mut batch: Vec<ForecastRow> = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((tenant, product, Ok(rows))) => {
                    debug!(tenant = %tenant, product = %product, rows = rows.len(), "product forecast");
                    report.products_forecast += 1;
                    *report.tenants.entry(tenant).or_default() += rows.len();
                    batch.extend(rows);
                }
                Ok((tenant, product, Err(e))) => {
                    warn!(tenant = %tenant, product = %product, error = %e, "forecast failed; product excluded");
                    report.products_failed += 1;
                }
                Err(e) => {
                    error!(error = %e, "forecast task aborted");
                    report.products_failed += 1;
                }
            }
        }

        if cancel.is_cancelled() {
            return cancelled(report);
        }

        if batch.is_empty() {
            info!("no predictions generated");
            return report.with_reason(SyncStatus::Success, SyncReport::NO_PREDICTIONS);
        }

        // Stable key order: identical inputs produce identical batches.
        batch.sort_by_cached_key(ForecastRow::key);

        match self.call("upsert_forecasts", self.store.upsert_forecasts(&batch)).await {
            Ok(written) => {
                info!(
                    rows = written,
                    forecast = report.products_forecast,
                    skipped = report.products_skipped,
                    failed = report.products_failed,
                    "forecast synchronization complete"
                );
                report.count = written;
                report
            }
            Err(e) => {
                error!(rows = batch.len(), error = %e, "failed to save predictions");
                report.tenants.clear();
                report.with_reason(SyncStatus::Error, SyncReport::DB_SAVE_FAILED)
            }
        }
    }

    /// Real history if any; otherwise synthetic history when enabled.
    fn history_for(
        &self,
        product: &Product,
        observations: Option<Vec<SalesObservation>>,
        today: NaiveDate,
    ) -> Vec<SalesObservation> {
        match (observations, &self.synthetic) {
            (Some(h), _) if !h.is_empty() => h,
            (_, Some(synthetic)) => {
                warn!(
                    tenant = %product.tenant_id,
                    product = %product.id,
                    "no sales history; using synthetic history"
                );
                synthetic.generate(today)
            }
            (h, None) => h.unwrap_or_default(),
        }
    }

    async fn fetch_covariates(&self, today: NaiveDate) -> Option<Arc<CovariateTable>> {
        let provider = self.regressors.as_ref()?;
        let start = today
            .checked_sub_days(Days::new(u64::from(self.config.history_days)))
            .unwrap_or(NaiveDate::MIN);
        let end = today
            .checked_add_days(Days::new(self.config.horizon_days as u64))
            .unwrap_or(NaiveDate::MAX);

        let table = provider.covariates(start, end).await;
        if table.is_none() {
            warn!(%start, %end, "no regressor data; forecasting without covariates");
        }
        table.map(Arc::new)
    }

    async fn call<T, F>(&self, operation: &'static str, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        let limit = self.config.store_timeout;
        timeout(limit, fut)
            .await
            .unwrap_or_else(|_| Err(StoreError::Timeout { operation, after: limit }))
    }
}

fn cancelled(mut report: SyncReport) -> SyncReport {
    warn!("forecast synchronization cancelled; nothing persisted");
    report.tenants.clear();
    report.count = 0;
    report.with_reason(SyncStatus::Error, SyncReport::CANCELLED)
}

/// One observation per (product, date); quantities on the same day are summed.
fn partition(rows: Vec<SalesRecord>) -> BTreeMap<ProductId, Vec<SalesObservation>> {
    let mut daily: BTreeMap<ProductId, BTreeMap<NaiveDate, f64>> = BTreeMap::new();
    for r in rows {
        *daily.entry(r.product_id).or_default().entry(r.date).or_default() += r.quantity;
    }

    daily
        .into_iter()
        .map(|(product, days)| {
            let series = days
                .into_iter()
                .map(|(date, quantity)| SalesObservation::new(date, quantity))
                .collect();
            (product, series)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_sums_same_day_rows() {
        let a = ProductId::new();
        let b = ProductId::new();
        let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let next = day.succ_opt().unwrap();
        let rec = |product_id, date, quantity| SalesRecord {
            product_id,
            date,
            quantity,
        };

        let parts = partition(vec![rec(a, next, 1.0), rec(a, day, 2.0), rec(a, day, 3.5), rec(b, day, 4.0)]);

        assert_eq!(
            parts[&a],
            vec![SalesObservation::new(day, 5.5), SalesObservation::new(next, 1.0)]
        );
        assert_eq!(parts[&b], vec![SalesObservation::new(day, 4.0)]);
    }
}
