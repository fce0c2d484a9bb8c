//! Date-keyed merge of weather and holiday data into regressor records.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tokio::time::{sleep, timeout};
use tracing::{info, warn};

use demandcast_forecast::{CovariateTable, RegressorRecord};

use super::{DailyTemperature, HolidayProvider, PublicHoliday, WeatherProvider};
use crate::config::ProviderConfig;
use crate::error::ExternalDataError;
use crate::retry::RetryPolicy;

/// Temperature assumed for holidays the weather source has no reading for.
pub const DEFAULT_HOLIDAY_TEMP: f64 = 20.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub country: String,
}

impl From<&ProviderConfig> for Location {
    fn from(c: &ProviderConfig) -> Self {
        Self {
            latitude: c.latitude,
            longitude: c.longitude,
            country: c.country.clone(),
        }
    }
}

/// Combines a weather and a holiday source.
///
/// Each source degrades independently: a failed or timed-out source
/// contributes nothing, the other is still used. Transient failures are
/// retried under `retry`; `budget` bounds a source's whole retry run.
pub struct RegressorProvider {
    weather: Arc<dyn WeatherProvider>,
    holidays: Arc<dyn HolidayProvider>,
    location: Location,
    budget: Duration,
    retry: RetryPolicy,
}

impl RegressorProvider {
    pub fn new(
        weather: Arc<dyn WeatherProvider>,
        holidays: Arc<dyn HolidayProvider>,
        location: Location,
        budget: Duration,
    ) -> Self {
        Self {
            weather,
            holidays,
            location,
            budget,
            retry: RetryPolicy::no_retry(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Merged records for `[start, end]`, one per date present in either source.
    pub async fn fetch(&self, start: NaiveDate, end: NaiveDate) -> Vec<RegressorRecord> {
        let loc = &self.location;
        let (weather, holidays) = tokio::join!(
            degrade("weather", self.budget, &self.retry, || {
                self.weather.daily_max_temp(loc.latitude, loc.longitude, start, end)
            }),
            degrade("holidays", self.budget, &self.retry, || {
                self.holidays.public_holidays(&loc.country, start, end)
            }),
        );

        let records = merge(&weather, &holidays);
        info!(
            %start,
            %end,
            weather_days = weather.len(),
            holidays = holidays.len(),
            records = records.len(),
            "regressors fetched"
        );
        records
    }

    /// [`fetch`](Self::fetch) as a covariate table; `None` when nothing came back.
    pub async fn covariates(&self, start: NaiveDate, end: NaiveDate) -> Option<CovariateTable> {
        let records = self.fetch(start, end).await;
        if records.is_empty() {
            None
        } else {
            Some(CovariateTable::from_records(&records))
        }
    }
}

async fn degrade<T, F, Fut>(source: &'static str, budget: Duration, retry: &RetryPolicy, call: F) -> Vec<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Vec<T>, ExternalDataError>>,
{
    match timeout(budget, with_retry(source, retry, call)).await {
        Ok(Ok(items)) => items,
        Ok(Err(e)) => {
            warn!(source, error = %e, "external data unavailable; continuing without it");
            Vec::new()
        }
        Err(_) => {
            warn!(source, budget = ?budget, "external data timed out; continuing without it");
            Vec::new()
        }
    }
}

async fn with_retry<T, F, Fut>(source: &'static str, retry: &RetryPolicy, call: F) -> Result<T, ExternalDataError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, ExternalDataError>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match call().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && retry.should_retry(attempt) => {
                let delay = retry.delay_for_attempt(attempt);
                warn!(
                    source,
                    attempt,
                    max_attempts = retry.max_attempts,
                    error = %e,
                    "external data request failed, retrying"
                );
                sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Weather seeds the table with `is_holiday = 0`; holidays then flag existing
/// days or add new ones at [`DEFAULT_HOLIDAY_TEMP`].
pub fn merge(weather: &[DailyTemperature], holidays: &[PublicHoliday]) -> Vec<RegressorRecord> {
    let mut merged: BTreeMap<NaiveDate, RegressorRecord> = weather
        .iter()
        .map(|w| {
            (
                w.date,
                RegressorRecord {
                    date: w.date,
                    temp_max: Some(w.temp_max),
                    is_holiday: false,
                    holiday_name: None,
                },
            )
        })
        .collect();

    for h in holidays {
        merged
            .entry(h.date)
            .and_modify(|r| {
                r.is_holiday = true;
                r.holiday_name.get_or_insert_with(|| h.name.clone());
            })
            .or_insert_with(|| RegressorRecord {
                date: h.date,
                temp_max: Some(DEFAULT_HOLIDAY_TEMP),
                is_holiday: true,
                holiday_name: Some(h.name.clone()),
            });
    }

    merged.into_values().collect()
}
