//! External data providers (weather, public holidays) and the regressor merge.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ExternalDataError;

mod http;
pub mod nager;
pub mod open_meteo;
pub mod regressors;

pub use nager::NagerHolidays;
pub use open_meteo::OpenMeteoWeather;
pub use regressors::{Location, RegressorProvider};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyTemperature {
    pub date: NaiveDate,
    pub temp_max: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicHoliday {
    pub date: NaiveDate,
    pub name: String,
}

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Daily maximum temperature for `[start, end]`. Days without data are omitted.
    async fn daily_max_temp(
        &self,
        latitude: f64,
        longitude: f64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyTemperature>, ExternalDataError>;
}

#[async_trait]
pub trait HolidayProvider: Send + Sync {
    /// Public holidays of `country` falling within `[start, end]`.
    async fn public_holidays(
        &self,
        country: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PublicHoliday>, ExternalDataError>;
}

#[async_trait]
impl<W> WeatherProvider for Arc<W>
where
    W: WeatherProvider + ?Sized,
{
    async fn daily_max_temp(
        &self,
        latitude: f64,
        longitude: f64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyTemperature>, ExternalDataError> {
        (**self).daily_max_temp(latitude, longitude, start, end).await
    }
}

#[async_trait]
impl<H> HolidayProvider for Arc<H>
where
    H: HolidayProvider + ?Sized,
{
    async fn public_holidays(
        &self,
        country: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PublicHoliday>, ExternalDataError> {
        (**self).public_holidays(country, start, end).await
    }
}
