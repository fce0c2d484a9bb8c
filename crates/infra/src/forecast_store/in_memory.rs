use std::collections::BTreeMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use demandcast_core::{ForecastKey, ForecastRow};

use super::PersistenceStore;
use crate::error::StoreError;

/// In-memory forecast table keyed like the Postgres unique constraint.
#[derive(Debug, Default)]
pub struct InMemoryForecastStore {
    rows: RwLock<BTreeMap<ForecastKey, ForecastRow>>,
    batches: AtomicUsize,
}

impl InMemoryForecastStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All stored rows in key order.
    pub fn rows(&self) -> Vec<ForecastRow> {
        match self.rows.read() {
            Ok(rows) => rows.values().cloned().collect(),
            Err(_) => vec![],
        }
    }

    pub fn get(&self, key: &ForecastKey) -> Option<ForecastRow> {
        self.rows.read().ok()?.get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.rows.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of successful upsert calls.
    pub fn batches(&self) -> usize {
        self.batches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PersistenceStore for InMemoryForecastStore {
    async fn upsert_forecasts(&self, rows: &[ForecastRow]) -> Result<usize, StoreError> {
        let mut table = self
            .rows
            .write()
            .map_err(|_| StoreError::Unavailable("forecast store lock poisoned".into()))?;
        for row in rows {
            table.insert(row.key(), row.clone());
        }
        self.batches.fetch_add(1, Ordering::SeqCst);
        Ok(rows.len())
    }
}
