use crate::error::{ConfigError, DeliveryError};
use crate::record::LogBatch;
use crate::sink::LogSink;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Path of the batch ingestion endpoint, relative to the API base URL.
pub const BATCH_PATH: &str = "/api/logs/batch";

/// [`LogSink`] talking to the DevSmith logs API over HTTP.
///
/// Each batch is one `POST <api_url>/api/logs/batch` carrying a bearer
/// token and a JSON body. Only `200 OK` and `201 Created` count as
/// delivered.
#[derive(Clone)]
pub struct HttpSink {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl HttpSink {
    /// Construct a sink for the given API base URL.
    ///
    /// **Parameters**
    /// - `api_url`: base URL, e.g. "http://localhost:3000". A trailing
    ///   slash is ignored.
    /// - `api_key`: credential sent as `Authorization: Bearer <api_key>`.
    /// - `timeout`: whole-request timeout applied to every send.
    pub fn new(api_url: &str, api_key: impl Into<String>, timeout: Duration) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ConfigError::HttpClient)?;

        Ok(Self {
            client,
            endpoint: format!("{}{}", api_url.trim_end_matches('/'), BATCH_PATH),
            api_key: api_key.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl LogSink for HttpSink {
    async fn send_batch(&self, batch: &LogBatch<'_>) -> Result<(), DeliveryError> {
        let body = serde_json::to_vec(batch)?;
        let resp = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .bearer_auth(&self.api_key)
            .body(body)
            .send()
            .await?;

        let status = resp.status();
        if matches!(status, StatusCode::OK | StatusCode::CREATED) {
            Ok(())
        } else {
            let body = resp.text().await.unwrap_or_else(|_| "<no body>".to_string());
            Err(DeliveryError::Status { status: status.as_u16(), body })
        }
    }
}
