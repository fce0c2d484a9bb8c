use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use demandcast_core::TenantId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Success,
    Error,
    Skipped,
}

/// Outcome of one synchronization run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub status: SyncStatus,
    /// Rows persisted.
    pub count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub products_considered: usize,
    pub products_forecast: usize,
    pub products_skipped: usize,
    pub products_failed: usize,
    /// Rows persisted per tenant.
    #[serde(default)]
    pub tenants: BTreeMap<TenantId, usize>,
}

impl SyncReport {
    pub const NO_PRODUCTS: &'static str = "no_products";
    pub const CATALOG_UNAVAILABLE: &'static str = "catalog_unavailable";
    pub const NO_PREDICTIONS: &'static str = "no_predictions_generated";
    pub const DB_SAVE_FAILED: &'static str = "db_save_failed";
    pub const CANCELLED: &'static str = "cancelled";

    pub(crate) fn new(status: SyncStatus) -> Self {
        Self {
            status,
            count: 0,
            reason: None,
            products_considered: 0,
            products_forecast: 0,
            products_skipped: 0,
            products_failed: 0,
            tenants: BTreeMap::new(),
        }
    }

    pub(crate) fn with_reason(mut self, status: SyncStatus, reason: &str) -> Self {
        self.status = status;
        self.reason = Some(reason.to_string());
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == SyncStatus::Success
    }
}
