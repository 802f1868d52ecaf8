//! HTTP transport for batch delivery.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

/// Errors a single delivery attempt can end in.
///
/// The engine never inspects these beyond "the attempt failed"; they exist so
/// warnings carry enough detail to diagnose without re-running.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("endpoint answered {0}")]
    Status(StatusCode),
}

/// Sends one serialized batch payload as one request.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, payload: &[u8]) -> Result<(), TransportError>;
}

/// POSTs payloads to the log-ingestion endpoint with the credential attached.
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpTransport {
    /// Build the client once; `timeout` bounds every attempt.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("testwire/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, payload: &[u8]) -> Result<(), TransportError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("Api-Key", &self.api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload.to_vec())
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!("endpoint accepted batch: {status}");
            Ok(())
        } else {
            Err(TransportError::Status(status))
        }
    }
}
