//! Postgres-backed product catalog.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use demandcast_core::{Product, ProductId, ProductStatus, TenantId};

use super::ProductCatalog;
use crate::error::{StoreError, map_sqlx_error};

/// Reads the `products` table; every tenant's active rows are returned.
#[derive(Debug, Clone)]
pub struct PostgresProductCatalog {
    pool: PgPool,
}

impl PostgresProductCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductCatalog for PostgresProductCatalog {
    async fn list_active(&self) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, tenant_id, name, status
            FROM products
            WHERE lower(status) = 'active'
            ORDER BY tenant_id, id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_active_products", e))?;

        rows.into_iter()
            .map(|row| {
                let id: Uuid = row.try_get("id").map_err(|e| map_sqlx_error("decode_product", e))?;
                let tenant_id: Uuid = row
                    .try_get("tenant_id")
                    .map_err(|e| map_sqlx_error("decode_product", e))?;
                let name: String = row.try_get("name").map_err(|e| map_sqlx_error("decode_product", e))?;
                let status: String = row.try_get("status").map_err(|e| map_sqlx_error("decode_product", e))?;
                let status: ProductStatus = status
                    .parse()
                    .map_err(|e| StoreError::storage("decode_product", format!("{e}")))?;

                Ok(Product {
                    id: ProductId::from_uuid(id),
                    name,
                    tenant_id: TenantId::from_uuid(tenant_id),
                    status,
                })
            })
            .collect()
    }
}
