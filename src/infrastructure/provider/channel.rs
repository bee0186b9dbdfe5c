use super::normalizer;
use crate::config::ChannelConfig;
use crate::error::Result;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::debug;
use url::Url;

/// Status and body text of a provider reply, before interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Long-lived outbound channel to the provider.
///
/// reqwest keeps the idle pool; the semaphore caps connections in flight.
/// Callers share one instance without any locking of their own.
#[derive(Debug, Clone)]
pub struct HttpChannel {
    client: Client,
    permits: Arc<Semaphore>,
    pool_timeout: Duration,
}

impl HttpChannel {
    pub fn new(config: &ChannelConfig) -> Result<Self> {
        config.validate()?;
        let client = Client::builder()
            .pool_max_idle_per_host(config.max_idle_connections)
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(normalizer::unclassified)?;

        Ok(Self {
            client,
            permits: Arc::new(Semaphore::new(config.max_connections)),
            pool_timeout: config.pool_timeout,
        })
    }

    /// Issues one authenticated JSON request and reads the whole reply.
    ///
    /// A connection slot is held until the body has been read.
    pub async fn send(
        &self,
        method: Method,
        url: Url,
        api_key: &str,
        body: Option<&Value>,
    ) -> Result<RawResponse> {
        let _permit = tokio::time::timeout(self.pool_timeout, self.permits.acquire())
            .await
            .map_err(|_| normalizer::pool_timeout(self.pool_timeout))?
            .map_err(normalizer::unclassified)?;

        debug!(%method, %url, "sending provider request");
        let mut request = self
            .client
            .request(method, url)
            .bearer_auth(api_key)
            .header(CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(normalizer::from_transport)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(normalizer::from_transport)?;
        Ok(RawResponse { status, body })
    }
}
