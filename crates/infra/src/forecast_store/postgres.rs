//! Postgres-backed forecast store.
//!
//! A whole batch goes out as one `INSERT .. SELECT FROM UNNEST(..)` statement,
//! so it commits or fails as a unit.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use demandcast_core::{ForecastKey, ForecastRow};

use super::PersistenceStore;
use crate::error::{StoreError, map_sqlx_error};

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS demand_forecasts (
    tenant_id        UUID             NOT NULL,
    product_id       UUID             NOT NULL,
    forecast_date    DATE             NOT NULL,
    scenario         TEXT             NOT NULL,
    predicted_demand DOUBLE PRECISION NOT NULL CHECK (predicted_demand >= 0),
    confidence_lower DOUBLE PRECISION NOT NULL,
    confidence_upper DOUBLE PRECISION NOT NULL,
    model_version    TEXT             NOT NULL,
    updated_at       TIMESTAMPTZ      NOT NULL DEFAULT now(),
    CONSTRAINT demand_forecasts_key UNIQUE (product_id, forecast_date, scenario)
)
"#;

const CREATE_TENANT_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS demand_forecasts_tenant_idx ON demand_forecasts (tenant_id, forecast_date)";

const UPSERT: &str = r#"
INSERT INTO demand_forecasts (
    tenant_id, product_id, forecast_date, scenario,
    predicted_demand, confidence_lower, confidence_upper, model_version
)
SELECT * FROM UNNEST(
    $1::uuid[], $2::uuid[], $3::date[], $4::text[],
    $5::float8[], $6::float8[], $7::float8[], $8::text[]
)
ON CONFLICT (product_id, forecast_date, scenario) DO UPDATE SET
    tenant_id        = EXCLUDED.tenant_id,
    predicted_demand = EXCLUDED.predicted_demand,
    confidence_lower = EXCLUDED.confidence_lower,
    confidence_upper = EXCLUDED.confidence_upper,
    model_version    = EXCLUDED.model_version,
    updated_at       = now()
"#;

#[derive(Debug, Clone)]
pub struct PostgresForecastStore {
    pool: PgPool,
}

impl PostgresForecastStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the forecast table and its indexes if missing.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_TABLE)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("create_demand_forecasts", e))?;
        sqlx::query(CREATE_TENANT_INDEX)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("create_demand_forecasts_index", e))?;
        Ok(())
    }
}

/// Column-major copy of a batch, one vector per bound array.
#[derive(Default)]
struct Columns {
    tenant_ids: Vec<Uuid>,
    product_ids: Vec<Uuid>,
    dates: Vec<NaiveDate>,
    scenarios: Vec<String>,
    predicted: Vec<f64>,
    lower: Vec<f64>,
    upper: Vec<f64>,
    versions: Vec<String>,
}

impl Columns {
    /// Later rows win on duplicate keys; Postgres refuses to update one row twice per statement.
    fn from_rows(rows: &[ForecastRow]) -> Self {
        let unique: BTreeMap<ForecastKey, &ForecastRow> = rows.iter().map(|r| (r.key(), r)).collect();

        let mut c = Columns::default();
        for r in unique.into_values() {
            c.tenant_ids.push(*r.tenant_id.as_uuid());
            c.product_ids.push(*r.product_id.as_uuid());
            c.dates.push(r.forecast_date);
            c.scenarios.push(r.scenario.as_str().to_string());
            c.predicted.push(r.predicted_demand);
            c.lower.push(r.confidence_lower);
            c.upper.push(r.confidence_upper);
            c.versions.push(r.model_version.clone());
        }
        c
    }
}

#[async_trait]
impl PersistenceStore for PostgresForecastStore {
    async fn upsert_forecasts(&self, rows: &[ForecastRow]) -> Result<usize, StoreError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let c = Columns::from_rows(rows);
        let written = c.product_ids.len();
        let result = sqlx::query(UPSERT)
            .bind(c.tenant_ids)
            .bind(c.product_ids)
            .bind(c.dates)
            .bind(c.scenarios)
            .bind(c.predicted)
            .bind(c.lower)
            .bind(c.upper)
            .bind(c.versions)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("upsert_forecasts", e))?;

        debug!(rows = written, affected = result.rows_affected(), "forecast batch upserted");
        Ok(written)
    }
}
