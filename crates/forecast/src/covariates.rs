//! Date-indexed covariate (regressor) table.
//!
//! External explanatory variables (temperature, holiday flag, or arbitrary
//! numeric columns supplied by callers) are stored per calendar day. Before a
//! model is fitted the table is aligned onto the model's timeline in a single
//! normalization pass: forward-fill from the last known value, then zero-fill
//! anything still missing.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Column name for the daily maximum temperature.
pub const TEMP_MAX: &str = "temp_max";
/// Column name for the public-holiday flag (0/1).
pub const IS_HOLIDAY: &str = "is_holiday";

/// Merged weather + holiday facts for a single day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressorRecord {
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_max: Option<f64>,
    #[serde(with = "holiday_flag")]
    pub is_holiday: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holiday_name: Option<String>,
}

mod holiday_flag {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(flag: &bool, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u8(u8::from(*flag))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        Ok(u8::deserialize(d)? != 0)
    }
}

/// Typed covariate table: `date -> column -> value`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CovariateTable {
    columns: BTreeSet<String>,
    cells: BTreeMap<NaiveDate, BTreeMap<String, f64>>,
}

/// Covariates aligned onto a model timeline (rows follow the timeline, columns
/// follow `columns`).
#[derive(Debug, Clone, PartialEq)]
pub struct ExogenousMatrix {
    pub columns: Vec<String>,
    pub history: Vec<Vec<f64>>,
    pub future: Vec<Vec<f64>>,
}

impl CovariateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the `temp_max` / `is_holiday` table from merged regressor records.
    pub fn from_records(records: &[RegressorRecord]) -> Self {
        let mut table = Self::new();
        for r in records {
            if let Some(t) = r.temp_max {
                table.insert(r.date, TEMP_MAX, t);
            }
            table.insert(r.date, IS_HOLIDAY, if r.is_holiday { 1.0 } else { 0.0 });
        }
        table
    }

    /// Set one cell. Non-finite values are treated as missing.
    pub fn insert(&mut self, date: NaiveDate, column: impl Into<String>, value: f64) {
        let column = column.into();
        self.columns.insert(column.clone());
        if value.is_finite() {
            self.cells.entry(date).or_default().insert(column, value);
        }
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Number of dates carrying at least one value.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn value(&self, date: NaiveDate, column: &str) -> Option<f64> {
        self.cells.get(&date).and_then(|row| row.get(column)).copied()
    }

    /// Align every column onto `timeline` (assumed ascending).
    ///
    /// Cells missing on a timeline date take the previous timeline value of the
    /// same column; leading gaps become `0.0`.
    pub fn align(&self, timeline: &[NaiveDate]) -> Vec<Vec<f64>> {
        let mut last: Vec<Option<f64>> = vec![None; self.columns.len()];
        timeline
            .iter()
            .map(|date| {
                let row = self.cells.get(date);
                self.columns
                    .iter()
                    .enumerate()
                    .map(|(i, col)| {
                        if let Some(v) = row.and_then(|r| r.get(col)) {
                            last[i] = Some(*v);
                        }
                        last[i].unwrap_or(0.0)
                    })
                    .collect()
            })
            .collect()
    }

    /// Align onto `history_dates ++ future_dates` and split the result.
    pub fn exogenous(&self, history_dates: &[NaiveDate], future_dates: &[NaiveDate]) -> ExogenousMatrix {
        let timeline: Vec<NaiveDate> = history_dates
            .iter()
            .chain(future_dates.iter())
            .copied()
            .collect();
        let mut rows = self.align(&timeline);
        let future = rows.split_off(history_dates.len());
        ExogenousMatrix {
            columns: self.columns.iter().cloned().collect(),
            history: rows,
            future,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    #[test]
    fn from_records_builds_temperature_and_holiday_columns() {
        let records = vec![
            RegressorRecord { date: d(1), temp_max: Some(14.0), is_holiday: false, holiday_name: None },
            RegressorRecord {
                date: d(2),
                temp_max: Some(20.0),
                is_holiday: true,
                holiday_name: Some("Fiesta".into()),
            },
        ];
        let table = CovariateTable::from_records(&records);

        assert_eq!(table.columns().collect::<Vec<_>>(), vec![IS_HOLIDAY, TEMP_MAX]);
        assert_eq!(table.value(d(1), TEMP_MAX), Some(14.0));
        assert_eq!(table.value(d(2), IS_HOLIDAY), Some(1.0));
    }

    #[test]
    fn align_forward_fills_then_zero_fills() {
        let mut table = CovariateTable::new();
        table.insert(d(2), "temp", 10.0);
        table.insert(d(4), "temp", 12.0);

        let aligned = table.align(&[d(1), d(2), d(3), d(4), d(5)]);
        let temps: Vec<f64> = aligned.iter().map(|r| r[0]).collect();

        assert_eq!(temps, vec![0.0, 10.0, 10.0, 12.0, 12.0]);
    }

    #[test]
    fn values_off_the_timeline_are_ignored() {
        let mut table = CovariateTable::new();
        table.insert(d(1), "promo", 1.0);

        let aligned = table.align(&[d(2), d(3)]);
        assert_eq!(aligned, vec![vec![0.0], vec![0.0]]);
    }

    #[test]
    fn exogenous_splits_history_and_future_rows() {
        let mut table = CovariateTable::new();
        table.insert(d(1), "temp", 5.0);
        table.insert(d(3), "temp", 7.0);

        let m = table.exogenous(&[d(1), d(2)], &[d(3), d(4)]);
        assert_eq!(m.columns, vec!["temp".to_string()]);
        assert_eq!(m.history, vec![vec![5.0], vec![5.0]]);
        assert_eq!(m.future, vec![vec![7.0], vec![7.0]]);
    }

    #[test]
    fn regressor_record_serializes_holiday_as_integer() {
        let r = RegressorRecord { date: d(1), temp_max: None, is_holiday: true, holiday_name: None };
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["is_holiday"], 1);
        assert!(json.get("temp_max").is_none());
    }
}
