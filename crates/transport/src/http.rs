use std::time::Duration;

use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;

use crate::{Transport, TransportError};

/// Exchanges frames with the debug server over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
}

impl HttpTransport {
    /// Create a transport with no request timeout.
    pub fn new(url: impl Into<String>) -> Result<Self, TransportError> {
        Self::with_timeout(url, None)
    }

    /// Create a transport whose exchanges fail after `timeout`.
    pub fn with_timeout(
        url: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Transport for HttpTransport {
    #[tracing::instrument(skip_all, fields(url = %self.url, len = frame.len()))]
    async fn exchange(&self, frame: Bytes) -> Result<Bytes, TransportError> {
        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(frame)
            .send()
            .await?;
        // servers report failures as error frames, whatever the status
        let status = response.status();
        if !status.is_success() {
            tracing::debug!(%status, "non-success status from debug server");
        }
        let body = response.bytes().await?;
        tracing::trace!(len = body.len(), "received response body");
        Ok(body)
    }
}
