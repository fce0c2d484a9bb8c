//! Catalog products as seen by the forecasting core (read-only).

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::id::{ProductId, TenantId};

/// Catalog lifecycle status. Only active products are forecast.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    Active,
    Inactive,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Active => "active",
            ProductStatus::Inactive => "inactive",
        }
    }
}

impl FromStr for ProductStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(ProductStatus::Active),
            "inactive" => Ok(ProductStatus::Inactive),
            other => Err(DomainError::unknown_variant("product status", other)),
        }
    }
}

/// A tenant's catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub tenant_id: TenantId,
    pub status: ProductStatus,
}

impl Product {
    pub fn active(id: ProductId, tenant_id: TenantId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            tenant_id,
            status: ProductStatus::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == ProductStatus::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parsing_is_case_insensitive() {
        assert_eq!("Active".parse::<ProductStatus>().unwrap(), ProductStatus::Active);
        assert_eq!(" inactive ".parse::<ProductStatus>().unwrap(), ProductStatus::Inactive);
        assert!("archived".parse::<ProductStatus>().is_err());
    }
}
