//! Sales history records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::id::ProductId;

/// One day of demand for a single series (the series is identified externally).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SalesObservation {
    pub date: NaiveDate,
    pub quantity: f64,
}

impl SalesObservation {
    pub fn new(date: NaiveDate, quantity: f64) -> Self {
        Self { date, quantity }
    }
}

/// A raw sales row as delivered by a sales source (keyed by product).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub product_id: ProductId,
    pub date: NaiveDate,
    pub quantity: f64,
}
