use std::time::Duration;

use thiserror::Error;

/// Failure talking to a storage collaborator (catalog, sales source, forecast store).
///
/// These are **infrastructure errors**, as opposed to forecasting errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("storage error in {operation}: {message}")]
    Storage { operation: &'static str, message: String },

    #[error("{operation} timed out after {after:?}")]
    Timeout { operation: &'static str, after: Duration },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn storage(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Storage {
            operation,
            message: message.into(),
        }
    }
}

pub(crate) fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => StoreError::storage(operation, db_err.message().to_string()),
        sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut => {
            StoreError::Unavailable(format!("connection pool unavailable in {operation}"))
        }
        sqlx::Error::Io(e) => StoreError::Unavailable(format!("io error in {operation}: {e}")),
        other => StoreError::storage(operation, other.to_string()),
    }
}

/// Failure fetching weather/holiday data. Always degrades to "no data".
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExternalDataError {
    #[error("http request failed: {0}")]
    Http(String),

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("request timed out")]
    Timeout,
}

impl ExternalDataError {
    /// Failures worth another attempt: timeouts, transport errors, 429 and 5xx.
    pub fn is_transient(&self) -> bool {
        match self {
            ExternalDataError::Timeout | ExternalDataError::Http(_) => true,
            ExternalDataError::Status { status, .. } => *status == 429 || *status >= 500,
            ExternalDataError::Decode(_) => false,
        }
    }
}

impl From<reqwest::Error> for ExternalDataError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ExternalDataError::Timeout
        } else if err.is_decode() {
            ExternalDataError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            ExternalDataError::Status {
                url: err.url().map(|u| u.to_string()).unwrap_or_default(),
                status: status.as_u16(),
            }
        } else {
            ExternalDataError::Http(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_provider_failures_are_retried() {
        assert!(ExternalDataError::Timeout.is_transient());
        assert!(ExternalDataError::Http("connection refused".into()).is_transient());
        assert!(ExternalDataError::Status { url: "x".into(), status: 503 }.is_transient());
        assert!(ExternalDataError::Status { url: "x".into(), status: 429 }.is_transient());
        assert!(!ExternalDataError::Status { url: "x".into(), status: 404 }.is_transient());
        assert!(!ExternalDataError::Decode("expected array".into()).is_transient());
    }
}
