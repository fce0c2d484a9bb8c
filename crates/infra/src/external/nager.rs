//! Nager.Date public holiday client.

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::http::JsonClient;
use super::{HolidayProvider, PublicHoliday};
use crate::config::ProviderConfig;
use crate::error::ExternalDataError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NagerHoliday {
    date: NaiveDate,
    name: String,
    #[serde(default)]
    local_name: Option<String>,
}

impl From<NagerHoliday> for PublicHoliday {
    fn from(h: NagerHoliday) -> Self {
        PublicHoliday {
            date: h.date,
            name: if h.name.is_empty() { h.local_name.unwrap_or_default() } else { h.name },
        }
    }
}

/// The API is per calendar year, so a range costs one request per year.
pub struct NagerHolidays {
    client: JsonClient,
    base_url: String,
}

impl NagerHolidays {
    pub fn from_config(config: &ProviderConfig) -> Self {
        Self {
            client: JsonClient::new(config.timeout),
            base_url: config.holiday_url.clone(),
        }
    }
}

fn in_range(holidays: Vec<NagerHoliday>, start: NaiveDate, end: NaiveDate) -> Vec<PublicHoliday> {
    holidays
        .into_iter()
        .filter(|h| h.date >= start && h.date <= end)
        .map(PublicHoliday::from)
        .collect()
}

#[async_trait]
impl HolidayProvider for NagerHolidays {
    async fn public_holidays(
        &self,
        country: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PublicHoliday>, ExternalDataError> {
        // Years are fetched concurrently so a range costs one request's latency.
        let mut years = JoinSet::new();
        for year in start.year()..=end.year() {
            let client = self.client.clone();
            let url = format!("{}/api/v3/PublicHolidays/{}/{}", self.base_url, year, country);
            years.spawn(async move { (year, client.get_json::<Vec<NagerHoliday>>(&url, &[]).await) });
        }

        let mut holidays = Vec::new();
        let mut fetched_any = false;
        let mut last_error = None;
        while let Some(joined) = years.join_next().await {
            let (year, result) = match joined {
                Ok(pair) => pair,
                Err(e) => {
                    last_error = Some(ExternalDataError::Http(format!("holiday task failed: {e}")));
                    continue;
                }
            };
            match result {
                Ok(list) => {
                    fetched_any = true;
                    holidays.extend(in_range(list, start, end));
                }
                Err(e) => {
                    warn!(year, country, error = %e, "holiday fetch failed; skipping year");
                    last_error = Some(e);
                }
            }
        }
        holidays.sort_by_key(|h| h.date);

        // Surface an error only when no year could be fetched at all.
        match last_error {
            Some(e) if !fetched_any => Err(e),
            _ => {
                debug!(count = holidays.len(), country, "fetched public holidays");
                Ok(holidays)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_and_filters_to_range() {
        let body = r#"[
            {"date": "2024-01-01", "localName": "Año Nuevo", "name": "New Year's Day", "countryCode": "ES"},
            {"date": "2024-05-01", "localName": "Fiesta del trabajo", "name": "Labour Day", "countryCode": "ES"},
            {"date": "2024-12-25", "localName": "Navidad", "name": "Christmas Day", "countryCode": "ES"}
        ]"#;
        let list: Vec<NagerHoliday> = serde_json::from_str(body).unwrap();
        let start = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();

        let holidays = in_range(list, start, end);
        assert_eq!(holidays.len(), 1);
        assert_eq!(holidays[0].name, "Labour Day");
        assert_eq!(holidays[0].date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
    }
}
