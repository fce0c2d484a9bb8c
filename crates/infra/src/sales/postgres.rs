//! Postgres-backed sales source.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use demandcast_core::{ProductId, SalesRecord};

use super::SalesSource;
use crate::error::{StoreError, map_sqlx_error};

/// Reads daily aggregated quantities from the `sales` table.
#[derive(Debug, Clone)]
pub struct PostgresSalesSource {
    pool: PgPool,
}

impl PostgresSalesSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SalesSource for PostgresSalesSource {
    async fn recent(&self, days: u32) -> Result<Vec<SalesRecord>, StoreError> {
        let days = i32::try_from(days).unwrap_or(i32::MAX);
        let rows = sqlx::query(
            r#"
            SELECT product_id, sold_at::date AS sale_date, SUM(quantity)::float8 AS quantity
            FROM sales
            WHERE sold_at::date > CURRENT_DATE - $1::int
              AND sold_at::date <= CURRENT_DATE
            GROUP BY product_id, sold_at::date
            ORDER BY product_id, sale_date
            "#,
        )
        .bind(days)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("recent_sales", e))?;

        rows.into_iter()
            .map(|row| {
                let product_id: Uuid = row
                    .try_get("product_id")
                    .map_err(|e| map_sqlx_error("decode_sale", e))?;
                let date: NaiveDate = row.try_get("sale_date").map_err(|e| map_sqlx_error("decode_sale", e))?;
                let quantity: f64 = row.try_get("quantity").map_err(|e| map_sqlx_error("decode_sale", e))?;
                Ok(SalesRecord {
                    product_id: ProductId::from_uuid(product_id),
                    date,
                    quantity,
                })
            })
            .collect()
    }
}
