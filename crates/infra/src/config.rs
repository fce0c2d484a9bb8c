//! Configuration loading and representation.
//!
//! Every `from_env()` has a `from_lookup()` twin taking a key → value
//! function, so tests can feed variables without touching the process
//! environment.

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use demandcast_core::TenantId;

use crate::retry::RetryPolicy;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{key} must be set")]
    Missing { key: &'static str },

    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
}

/// Upper bound on horizon and history windows, in days.
pub const MAX_WINDOW_DAYS: u32 = 3650;

/// Slack added to a derived regressor budget on top of the worst-case retry run.
const SOURCE_BUDGET_SLACK: Duration = Duration::from_secs(1);

/// Batch synchronization settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    /// Days to forecast per product.
    pub horizon_days: usize,
    /// Days of sales history fetched once per run.
    pub history_days: u32,
    /// Upper bound on products forecast in parallel.
    pub max_concurrency: usize,
    /// Deadline for each catalog/sales/store call.
    pub store_timeout: Duration,
    /// Fabricate history for products with none. Demo/test only.
    pub synthesize_missing_history: bool,
    pub synthetic_seed: Option<u64>,
    /// Restrict the run to one tenant; `None` means all tenants.
    pub tenant: Option<TenantId>,
    pub use_regressors: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            horizon_days: 14,
            history_days: 90,
            max_concurrency: default_concurrency(),
            store_timeout: Duration::from_secs(30),
            synthesize_missing_history: false,
            synthetic_seed: None,
            tenant: None,
            use_regressors: false,
        }
    }
}

impl SyncConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        let max_concurrency: usize = parse_or(&lookup, "DEMANDCAST_MAX_CONCURRENCY", d.max_concurrency)?;
        if max_concurrency == 0 {
            return Err(invalid("DEMANDCAST_MAX_CONCURRENCY", "0"));
        }

        Ok(Self {
            horizon_days: at_most(&lookup, "DEMANDCAST_HORIZON_DAYS", d.horizon_days, MAX_WINDOW_DAYS as usize)?,
            history_days: at_most(&lookup, "DEMANDCAST_HISTORY_DAYS", d.history_days, MAX_WINDOW_DAYS)?,
            max_concurrency,
            store_timeout: millis_or(&lookup, "DEMANDCAST_STORE_TIMEOUT_MS", d.store_timeout)?,
            synthesize_missing_history: flag_or(
                &lookup,
                "DEMANDCAST_SYNTHESIZE_MISSING_HISTORY",
                d.synthesize_missing_history,
            )?,
            synthetic_seed: parse_opt(&lookup, "DEMANDCAST_SYNTHETIC_SEED")?,
            tenant: parse_opt(&lookup, "DEMANDCAST_TENANT_ID")?,
            use_regressors: flag_or(&lookup, "DEMANDCAST_USE_REGRESSORS", d.use_regressors)?,
        })
    }
}

/// Weather/holiday provider settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub latitude: f64,
    pub longitude: f64,
    /// ISO 3166-1 alpha-2 code used for public holidays.
    pub country: String,
    pub weather_url: String,
    pub holiday_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    pub retry: RetryPolicy,
    /// Budget for one source's whole retry run; derived from `timeout` and
    /// `retry` when unset.
    pub source_timeout: Option<Duration>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        // Madrid
        Self {
            latitude: 40.4168,
            longitude: -3.7038,
            country: "ES".to_string(),
            weather_url: "https://api.open-meteo.com".to_string(),
            holiday_url: "https://date.nager.at".to_string(),
            timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
            source_timeout: None,
        }
    }
}

impl ProviderConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();

        let latitude: f64 = parse_or(&lookup, "DEMANDCAST_LATITUDE", d.latitude)?;
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(invalid("DEMANDCAST_LATITUDE", latitude.to_string()));
        }
        let longitude: f64 = parse_or(&lookup, "DEMANDCAST_LONGITUDE", d.longitude)?;
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(invalid("DEMANDCAST_LONGITUDE", longitude.to_string()));
        }

        let country = lookup("DEMANDCAST_COUNTRY")
            .map(|c| c.trim().to_uppercase())
            .unwrap_or(d.country);
        if country.len() != 2 || !country.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(invalid("DEMANDCAST_COUNTRY", country));
        }

        let retry = RetryPolicy {
            max_attempts: parse_or(&lookup, "DEMANDCAST_PROVIDER_RETRY_ATTEMPTS", d.retry.max_attempts)?,
            base_delay: millis_or(&lookup, "DEMANDCAST_PROVIDER_RETRY_BACKOFF_MS", d.retry.base_delay)?,
            ..d.retry
        };

        let source_timeout = parse_opt::<u64, _>(&lookup, "DEMANDCAST_REGRESSOR_TIMEOUT_MS")?;
        if source_timeout == Some(0) {
            return Err(invalid("DEMANDCAST_REGRESSOR_TIMEOUT_MS", "0"));
        }
        let source_timeout = source_timeout.map(Duration::from_millis);

        Ok(Self {
            latitude,
            longitude,
            country,
            weather_url: url_or(&lookup, "DEMANDCAST_WEATHER_URL", d.weather_url),
            holiday_url: url_or(&lookup, "DEMANDCAST_HOLIDAY_URL", d.holiday_url),
            timeout: millis_or(&lookup, "DEMANDCAST_PROVIDER_TIMEOUT_MS", d.timeout)?,
            retry,
            source_timeout,
        })
    }

    /// Time a single source may spend across all of its attempts.
    pub fn source_budget(&self) -> Duration {
        self.source_timeout
            .unwrap_or_else(|| self.retry.worst_case(self.timeout) + SOURCE_BUDGET_SLACK)
    }
}

/// Postgres connection settings for the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup("DATABASE_URL")
            .filter(|u| !u.trim().is_empty())
            .ok_or(ConfigError::Missing { key: "DATABASE_URL" })?;
        Ok(Self {
            url,
            max_connections: parse_or(&lookup, "DEMANDCAST_DB_MAX_CONNECTIONS", 5)?,
        })
    }
}

fn default_concurrency() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4)
}

fn invalid(key: &'static str, value: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.into(),
    }
}

fn parse_opt<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw.trim().parse().map(Some).map_err(|_| invalid(key, raw)),
    }
}

fn parse_or<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    Ok(parse_opt(lookup, key)?.unwrap_or(default))
}

fn at_most<T, F>(lookup: &F, key: &'static str, default: T, max: T) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd + ToString,
    F: Fn(&str) -> Option<String>,
{
    let value = parse_or(lookup, key, default)?;
    if value > max {
        return Err(invalid(key, value.to_string()));
    }
    Ok(value)
}

fn millis_or<F>(lookup: &F, key: &'static str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    Ok(parse_opt::<u64, _>(lookup, key)?.map_or(default, Duration::from_millis))
}

fn flag_or<F>(lookup: &F, key: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "" => Ok(default),
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(invalid(key, raw)),
        },
    }
}

fn url_or<F>(lookup: &F, key: &'static str, default: String) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|u| u.trim().trim_end_matches('/').to_string())
        .filter(|u| !u.is_empty())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn sync_defaults() {
        let cfg = SyncConfig::from_lookup(env(&[])).unwrap();
        assert_eq!(cfg.horizon_days, 14);
        assert_eq!(cfg.history_days, 90);
        assert_eq!(cfg.store_timeout, Duration::from_secs(30));
        assert!(!cfg.synthesize_missing_history);
        assert!(cfg.tenant.is_none());
        assert!(cfg.max_concurrency >= 1);
    }

    #[test]
    fn sync_overrides() {
        let tenant = TenantId::new();
        let tenant_str = tenant.to_string();
        let cfg = SyncConfig::from_lookup(env(&[
            ("DEMANDCAST_HORIZON_DAYS", "7"),
            ("DEMANDCAST_SYNTHESIZE_MISSING_HISTORY", "yes"),
            ("DEMANDCAST_SYNTHETIC_SEED", "42"),
            ("DEMANDCAST_TENANT_ID", tenant_str.as_str()),
            ("DEMANDCAST_MAX_CONCURRENCY", "2"),
        ]))
        .unwrap();

        assert_eq!(cfg.horizon_days, 7);
        assert!(cfg.synthesize_missing_history);
        assert_eq!(cfg.synthetic_seed, Some(42));
        assert_eq!(cfg.tenant, Some(tenant));
        assert_eq!(cfg.max_concurrency, 2);
    }

    #[test]
    fn invalid_values_are_reported_not_defaulted() {
        let err = SyncConfig::from_lookup(env(&[("DEMANDCAST_HORIZON_DAYS", "two weeks")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                key: "DEMANDCAST_HORIZON_DAYS",
                value: "two weeks".into()
            }
        );
        assert!(SyncConfig::from_lookup(env(&[("DEMANDCAST_USE_REGRESSORS", "maybe")])).is_err());
        assert!(SyncConfig::from_lookup(env(&[("DEMANDCAST_MAX_CONCURRENCY", "0")])).is_err());
    }

    #[test]
    fn windows_are_bounded() {
        let cfg = SyncConfig::from_lookup(env(&[
            ("DEMANDCAST_HORIZON_DAYS", "3650"),
            ("DEMANDCAST_HISTORY_DAYS", "3650"),
        ]))
        .unwrap();
        assert_eq!(cfg.history_days, MAX_WINDOW_DAYS);

        let err = SyncConfig::from_lookup(env(&[("DEMANDCAST_HISTORY_DAYS", "4000000000")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                key: "DEMANDCAST_HISTORY_DAYS",
                value: "4000000000".into()
            }
        );
        assert!(SyncConfig::from_lookup(env(&[("DEMANDCAST_HORIZON_DAYS", "3651")])).is_err());
    }

    #[test]
    fn source_budget_outlasts_every_retry() {
        let cfg = ProviderConfig::from_lookup(env(&[])).unwrap();
        let all_attempts = cfg.timeout * cfg.retry.max_attempts + cfg.retry.total_backoff();
        assert!(cfg.source_budget() > all_attempts);

        let cfg = ProviderConfig::from_lookup(env(&[("DEMANDCAST_REGRESSOR_TIMEOUT_MS", "45000")])).unwrap();
        assert_eq!(cfg.source_budget(), Duration::from_secs(45));
        assert!(ProviderConfig::from_lookup(env(&[("DEMANDCAST_REGRESSOR_TIMEOUT_MS", "0")])).is_err());
    }

    #[test]
    fn provider_defaults_to_madrid() {
        let cfg = ProviderConfig::from_lookup(env(&[])).unwrap();
        assert_eq!(cfg.latitude, 40.4168);
        assert_eq!(cfg.longitude, -3.7038);
        assert_eq!(cfg.country, "ES");
        assert_eq!(cfg.timeout, Duration::from_secs(10));
    }

    #[test]
    fn provider_overrides_and_validation() {
        let cfg = ProviderConfig::from_lookup(env(&[
            ("DEMANDCAST_COUNTRY", "de"),
            ("DEMANDCAST_WEATHER_URL", "http://localhost:9000/"),
            ("DEMANDCAST_PROVIDER_RETRY_ATTEMPTS", "1"),
        ]))
        .unwrap();
        assert_eq!(cfg.country, "DE");
        assert_eq!(cfg.weather_url, "http://localhost:9000");
        assert_eq!(cfg.retry.max_attempts, 1);

        assert!(ProviderConfig::from_lookup(env(&[("DEMANDCAST_LATITUDE", "123")])).is_err());
        assert!(ProviderConfig::from_lookup(env(&[("DEMANDCAST_COUNTRY", "Spain")])).is_err());
    }

    #[test]
    fn database_url_is_required() {
        assert_eq!(
            DatabaseConfig::from_lookup(env(&[])).unwrap_err(),
            ConfigError::Missing { key: "DATABASE_URL" }
        );
        let cfg = DatabaseConfig::from_lookup(env(&[("DATABASE_URL", "postgres://localhost/demand")])).unwrap();
        assert_eq!(cfg.max_connections, 5);
    }
}
