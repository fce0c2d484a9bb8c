//! Batch forecast synchronization: one run over the catalog, then exit.
//!
//! Exit status is non-zero when the run reports `error`.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use demandcast_infra::{
    DatabaseConfig, Location, NagerHolidays, OpenMeteoWeather, PostgresForecastStore, PostgresProductCatalog,
    PostgresSalesSource, ProviderConfig, RegressorProvider, SyncConfig, SyncOrchestrator, SyncStatus, cancellation,
};
use demandcast_observability::ObservabilityConfig;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    demandcast_observability::init_with(&ObservabilityConfig::from_env());

    let sync = SyncConfig::from_env().context("invalid sync configuration")?;
    let db = DatabaseConfig::from_env().context("invalid database configuration")?;

    let pool = PgPoolOptions::new()
        .max_connections(db.max_connections)
        .connect(&db.url)
        .await
        .context("failed to connect to postgres")?;

    let store = PostgresForecastStore::new(pool.clone());
    store.ensure_schema().await.context("failed to prepare forecast table")?;

    let use_regressors = sync.use_regressors;
    let mut orchestrator = SyncOrchestrator::new(
        Arc::new(PostgresProductCatalog::new(pool.clone())),
        Arc::new(PostgresSalesSource::new(pool.clone())),
        Arc::new(store),
        sync,
    );

    if use_regressors {
        let providers = ProviderConfig::from_env().context("invalid provider configuration")?;
        let regressors = RegressorProvider::new(
            Arc::new(OpenMeteoWeather::from_config(&providers)),
            Arc::new(NagerHolidays::from_config(&providers)),
            Location::from(&providers),
            providers.source_budget(),
        )
        .with_retry(providers.retry.clone());
        orchestrator = orchestrator.with_regressors(Arc::new(regressors));
        tracing::info!(
            country = %providers.country,
            budget = ?providers.source_budget(),
            "regressors enabled"
        );
    }

    let (handle, signal) = cancellation();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received; cancelling run");
            handle.cancel();
        }
    });

    let report = orchestrator.run_with_cancel(&signal).await;
    println!("{}", serde_json::to_string_pretty(&report)?);

    pool.close().await;

    Ok(match report.status {
        SyncStatus::Error => ExitCode::FAILURE,
        SyncStatus::Success | SyncStatus::Skipped => ExitCode::SUCCESS,
    })
}
