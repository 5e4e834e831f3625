//! HttpSink - JSON POST to the collector upsert endpoint

use std::time::Duration;

use contracts::{ContractError, SeriesPayload, SeriesSink};
use reqwest::{Client, Url};
use tracing::{debug, instrument};

/// Sink that POSTs each series summary as JSON
///
/// Any 2xx response counts as delivered; other statuses are delivery errors.
pub struct HttpSink {
    name: String,
    client: Client,
    endpoint: Url,
}

impl HttpSink {
    /// Create a new HttpSink
    ///
    /// # Errors
    /// Returns `SinkConnection` if the endpoint is not an absolute URL or the client
    /// cannot be built
    pub fn new(
        name: impl Into<String>,
        endpoint: &str,
        timeout: Duration,
    ) -> Result<Self, ContractError> {
        let name = name.into();
        let endpoint = Url::parse(endpoint).map_err(|e| {
            ContractError::sink_connection(&name, format!("invalid endpoint '{}': {}", endpoint, e))
        })?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ContractError::sink_connection(&name, e.to_string()))?;

        debug!(sink = %name, endpoint = %endpoint, "HttpSink created");

        Ok(Self {
            name,
            client,
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl SeriesSink for HttpSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "http_sink_deliver",
        skip(self, payload),
        fields(sink = %self.name, series_instance_uid = %payload.series_instance_uid)
    )]
    async fn deliver(&self, payload: &SeriesPayload) -> Result<(), ContractError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(payload)
            .send()
            .await
            .map_err(|e| ContractError::sink_delivery(&self.name, e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            debug!(status = status.as_u16(), "collector accepted series");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(ContractError::sink_delivery(
            &self.name,
            format!("endpoint returned {}: {}", status, body),
        ))
    }
}
