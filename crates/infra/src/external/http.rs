use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::ExternalDataError;

/// JSON GET client shared by the data providers.
///
/// One attempt per call, bounded by the request timeout. Retries happen a
/// level up, in [`RegressorProvider`](super::RegressorProvider).
#[derive(Debug, Clone)]
pub(crate) struct JsonClient {
    http: HttpClient,
}

impl JsonClient {
    pub(crate) fn new(timeout: Duration) -> Self {
        let http = HttpClient::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(5)))
            .build()
            .unwrap_or_else(|err| {
                warn!(error = %err, "failed to build HTTP client, using defaults");
                HttpClient::new()
            });
        Self { http }
    }

    /// GET `url` and decode the JSON body.
    pub(crate) async fn get_json<T>(&self, url: &str, query: &[(&str, String)]) -> Result<T, ExternalDataError>
    where
        T: DeserializeOwned,
    {
        let response = self.http.get(url).query(query).send().await?.error_for_status()?;
        Ok(response.json::<T>().await?)
    }
}
