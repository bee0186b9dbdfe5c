use super::channel::{HttpChannel, RawResponse};
use super::{normalizer, transformers};
use crate::config::Settings;
use crate::domain::transaction::{
    BalanceResponse, Instrument, LimitsResponse, TransactionRequest, TransactionResponse,
};
use crate::error::{GatewayError, Result};
use chrono::Utc;
use reqwest::Method;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Message used when the provider refuses a cancel without saying why.
pub const CANCEL_FALLBACK_MESSAGE: &str = "Transaction should be in progress.";

/// Client for the provider API.
///
/// Owns one [`HttpChannel`]; share a single instance (behind an `Arc` if
/// needed) across all concurrent callers.
pub struct ProviderClient {
    channel: HttpChannel,
    base_url: Url,
    api_key: String,
    debug: bool,
}

impl ProviderClient {
    /// Creates a new `ProviderClient`.
    ///
    /// # Arguments
    ///
    /// * `channel` - Outbound channel carrying every provider call.
    /// * `base_url` - Provider API root; endpoint paths are appended to it.
    /// * `api_key` - Bearer credential for the provider.
    /// * `debug` - Answer balance and limits with canned data, without network calls.
    pub fn new(
        channel: HttpChannel,
        base_url: Url,
        api_key: impl Into<String>,
        debug: bool,
    ) -> Self {
        Self {
            channel,
            base_url,
            api_key: api_key.into(),
            debug,
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let channel = HttpChannel::new(&settings.channel)?;
        Ok(Self::new(
            channel,
            settings.provider_base_url.clone(),
            settings.provider_api_key.clone(),
            settings.debug,
        ))
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                GatewayError::Misconfigured(format!(
                    "provider base url cannot carry a path: {}",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn call(&self, method: Method, url: Url, body: Option<&Value>) -> Result<RawResponse> {
        self.channel.send(method, url, &self.api_key, body).await
    }

    /// Opens a transaction of the given instrument with the provider.
    #[instrument(
        skip(self, request),
        fields(merchant_transaction_id = %request.merchant_transaction_id)
    )]
    pub async fn create_transaction(
        &self,
        instrument: Instrument,
        request: &TransactionRequest,
    ) -> Result<TransactionResponse> {
        let payload = Value::Object(transformers::to_provider(instrument, request));
        let url = self.endpoint(&["transactions", instrument.endpoint_segment()])?;
        info!("sending transaction to provider");
        debug!(%payload, "provider payload");

        let reply = self.call(Method::POST, url, Some(&payload)).await?;
        if !reply.is_success() {
            return Err(normalizer::from_status(reply.status, &reply.body));
        }
        info!(status = reply.status, "provider accepted transaction");
        debug!(body = %reply.body, "provider reply");

        transformers::from_provider(instrument, &reply.body, Utc::now())
    }

    pub async fn create_card_transaction(
        &self,
        request: &TransactionRequest,
    ) -> Result<TransactionResponse> {
        self.create_transaction(Instrument::Card, request).await
    }

    pub async fn create_card_internal_transaction(
        &self,
        request: &TransactionRequest,
    ) -> Result<TransactionResponse> {
        self.create_transaction(Instrument::CardInternal, request).await
    }

    pub async fn create_card_cross_border_transaction(
        &self,
        request: &TransactionRequest,
    ) -> Result<TransactionResponse> {
        self.create_transaction(Instrument::CardCrossBorder, request).await
    }

    pub async fn create_sbp_transaction(
        &self,
        request: &TransactionRequest,
    ) -> Result<TransactionResponse> {
        self.create_transaction(Instrument::Sbp, request).await
    }

    pub async fn create_sbp_internal_transaction(
        &self,
        request: &TransactionRequest,
    ) -> Result<TransactionResponse> {
        self.create_transaction(Instrument::SbpInternal, request).await
    }

    pub async fn create_sbp_cross_border_transaction(
        &self,
        request: &TransactionRequest,
    ) -> Result<TransactionResponse> {
        self.create_transaction(Instrument::SbpCrossBorder, request).await
    }

    pub async fn create_qr_transaction(
        &self,
        request: &TransactionRequest,
    ) -> Result<TransactionResponse> {
        self.create_transaction(Instrument::Qr, request).await
    }

    pub async fn create_sim_transaction(
        &self,
        request: &TransactionRequest,
    ) -> Result<TransactionResponse> {
        self.create_transaction(Instrument::Sim, request).await
    }

    /// Asks the provider to cancel a transaction.
    ///
    /// `204` (or any other 2xx) is success. `400` is a business refusal and
    /// becomes [`GatewayError::ProviderRejected`] carrying the provider's
    /// message, or [`CANCEL_FALLBACK_MESSAGE`] when none can be read.
    #[instrument(skip(self))]
    pub async fn cancel_transaction(&self, transaction_id: &str) -> Result<()> {
        if transaction_id.trim().is_empty() {
            return Err(GatewayError::validation("transaction_id must not be empty"));
        }
        let url = self.endpoint(&["transactions", transaction_id, "cancel"])?;
        info!("requesting cancellation");

        let reply = self.call(Method::POST, url, None).await?;
        match reply.status {
            204 => {
                info!("transaction canceled");
                Ok(())
            }
            400 => {
                let message = serde_json::from_str::<Value>(&reply.body)
                    .ok()
                    .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
                    .unwrap_or_else(|| CANCEL_FALLBACK_MESSAGE.to_string());
                warn!(%message, "provider refused cancellation");
                Err(GatewayError::ProviderRejected { message })
            }
            _ if reply.is_success() => {
                info!(status = reply.status, "transaction canceled");
                Ok(())
            }
            status => Err(normalizer::from_status(status, &reply.body)),
        }
    }

    #[instrument(skip(self))]
    pub async fn get_balance(&self) -> Result<BalanceResponse> {
        info!("requesting balance");
        if self.debug {
            return Ok(BalanceResponse {
                balance: Decimal::new(10000, 2),
                currency_rate: Decimal::new(9032, 2),
            });
        }

        let url = self.endpoint(&["api", "v1", "balance"])?;
        let reply = self.call(Method::GET, url, None).await?;
        if !reply.is_success() {
            return Err(normalizer::from_status(reply.status, &reply.body));
        }
        transformers::balance_from_provider(&reply.body)
    }

    #[instrument(skip(self))]
    pub async fn get_limits(&self, currency: &str) -> Result<LimitsResponse> {
        info!("requesting limits");
        if self.debug {
            return transformers::limits_from_value(&json!({
                "card": {"min_amount": "100", "max_amount": "200000"},
                "sbp": {"min_amount": "100", "max_amount": "200000"}
            }));
        }

        let url = self.endpoint(&["api", "v1", "limits", currency])?;
        let reply = self.call(Method::GET, url, None).await?;
        if !reply.is_success() {
            return Err(normalizer::from_status(reply.status, &reply.body));
        }
        transformers::limits_from_provider(&reply.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChannelConfig;
    use rust_decimal_macros::dec;

    fn client(base: &str, debug: bool) -> ProviderClient {
        let channel = HttpChannel::new(&ChannelConfig::default()).unwrap();
        ProviderClient::new(channel, Url::parse(base).unwrap(), "key", debug)
    }

    #[test]
    fn test_endpoint_appends_and_escapes_segments() {
        let client = client("https://api.provider.com/v2/", false);
        let url = client.endpoint(&["transactions", "a/b", "cancel"]).unwrap();
        assert_eq!(url.as_str(), "https://api.provider.com/v2/transactions/a%2Fb/cancel");
    }

    #[tokio::test]
    async fn test_debug_mode_short_circuits() {
        // Unroutable base: any network call would fail.
        let client = client("http://127.0.0.1:9", true);

        let balance = client.get_balance().await.unwrap();
        assert_eq!(balance.balance, dec!(100.00));
        assert_eq!(balance.currency_rate, dec!(90.32));

        let limits = client.get_limits("RUB").await.unwrap();
        assert_eq!(limits.card.unwrap().max_amount, dec!(200000));
        assert!(limits.qr.is_none());
    }

    #[tokio::test]
    async fn test_cancel_rejects_blank_id() {
        let client = client("http://127.0.0.1:9", false);
        assert!(matches!(
            client.cancel_transaction("  ").await,
            Err(GatewayError::Validation { .. })
        ));
    }
}
