//! Open-Meteo daily forecast client.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::debug;

use super::http::JsonClient;
use super::{DailyTemperature, WeatherProvider};
use crate::config::ProviderConfig;
use crate::error::ExternalDataError;

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    daily: Option<DailySeries>,
}

#[derive(Debug, Deserialize)]
struct DailySeries {
    #[serde(default)]
    time: Vec<NaiveDate>,
    #[serde(default)]
    temperature_2m_max: Vec<Option<f64>>,
}

impl ForecastResponse {
    /// Pair dates with temperatures, dropping days the API reports as null.
    fn into_temperatures(self) -> Vec<DailyTemperature> {
        let Some(daily) = self.daily else {
            return Vec::new();
        };
        daily
            .time
            .into_iter()
            .zip(daily.temperature_2m_max)
            .filter_map(|(date, t)| t.filter(|t| t.is_finite()).map(|temp_max| DailyTemperature { date, temp_max }))
            .collect()
    }
}

pub struct OpenMeteoWeather {
    client: JsonClient,
    base_url: String,
}

impl OpenMeteoWeather {
    pub fn from_config(config: &ProviderConfig) -> Self {
        Self {
            client: JsonClient::new(config.timeout),
            base_url: config.weather_url.clone(),
        }
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoWeather {
    async fn daily_max_temp(
        &self,
        latitude: f64,
        longitude: f64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyTemperature>, ExternalDataError> {
        let url = format!("{}/v1/forecast", self.base_url);
        let query = [
            ("latitude", latitude.to_string()),
            ("longitude", longitude.to_string()),
            ("daily", "temperature_2m_max".to_string()),
            ("timezone", "auto".to_string()),
            ("start_date", start.to_string()),
            ("end_date", end.to_string()),
        ];

        let response: ForecastResponse = self.client.get_json(&url, &query).await?;
        let temps = response.into_temperatures();
        debug!(days = temps.len(), %start, %end, "fetched daily temperatures");
        Ok(temps)
    }
}
