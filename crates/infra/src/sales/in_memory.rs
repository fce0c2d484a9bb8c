use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{Days, NaiveDate};

use demandcast_core::{Clock, SalesRecord, SystemClock};

use super::SalesSource;
use crate::error::StoreError;

/// In-memory sales source for tests/dev.
///
/// The history window is measured from its own clock, so tests pin it with a
/// `FixedClock`.
pub struct InMemorySalesSource {
    records: RwLock<Vec<SalesRecord>>,
    clock: Arc<dyn Clock>,
}

impl InMemorySalesSource {
    pub fn new(records: Vec<SalesRecord>) -> Self {
        Self {
            records: RwLock::new(records),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn push(&self, record: SalesRecord) {
        if let Ok(mut records) = self.records.write() {
            records.push(record);
        }
    }
}

impl Default for InMemorySalesSource {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl SalesSource for InMemorySalesSource {
    async fn recent(&self, days: u32) -> Result<Vec<SalesRecord>, StoreError> {
        let today = self.clock.today();
        let since = today.checked_sub_days(Days::new(u64::from(days))).unwrap_or(NaiveDate::MIN);
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::Unavailable("sales lock poisoned".into()))?;

        Ok(records
            .iter()
            .filter(|r| r.date > since && r.date <= today)
            .copied()
            .collect())
    }
}
