use crate::application::ingestion::WebhookGuard;
use crate::domain::ports::{
    AppealRef, AppealStoreBox, TransactionStatusStoreBox, TransactionStatusUpdate,
};
use crate::domain::webhook::{
    AppealStatus, AppealWebhook, TransactionStatus, TransactionWebhook, WebhookAck,
};
use crate::error::{GatewayError, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::{error, info, instrument, warn};

pub const TRANSACTION_ACK: &str = "Webhook processed successfully";
pub const APPEAL_ACK: &str = "Appeal webhook processed successfully";

/// Which webhook endpoint a delivery arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookKind {
    Transaction,
    Appeal,
}

impl fmt::Display for WebhookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebhookKind::Transaction => f.write_str("transaction"),
            WebhookKind::Appeal => f.write_str("appeal"),
        }
    }
}

impl FromStr for WebhookKind {
    type Err = GatewayError;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "transaction" => Ok(WebhookKind::Transaction),
            "appeal" => Ok(WebhookKind::Appeal),
            other => Err(GatewayError::validation(format!(
                "unknown webhook kind: {other}"
            ))),
        }
    }
}

/// Drives the transaction and appeal state machines from provider webhooks.
///
/// Holds no per-delivery state, so one instance can serve concurrent deliveries.
pub struct WebhookProcessor {
    guard: WebhookGuard,
    transaction_store: TransactionStatusStoreBox,
    appeal_store: AppealStoreBox,
}

impl WebhookProcessor {
    /// Creates a new `WebhookProcessor`.
    ///
    /// # Arguments
    ///
    /// * `guard` - Admission checks applied to raw deliveries.
    /// * `transaction_store` - Receives one status update per accepted transaction webhook.
    /// * `appeal_store` - Receives appeal side effects and status updates.
    pub fn new(
        guard: WebhookGuard,
        transaction_store: TransactionStatusStoreBox,
        appeal_store: AppealStoreBox,
    ) -> Self {
        Self {
            guard,
            transaction_store,
            appeal_store,
        }
    }

    /// Full path for a raw delivery: admission, schema validation, state machine.
    pub async fn handle(
        &self,
        kind: WebhookKind,
        url: &str,
        body: &[u8],
        signature: Option<&str>,
    ) -> Result<WebhookAck> {
        let payload = self.guard.admit(url, body, signature)?;
        match kind {
            WebhookKind::Transaction => self.process_transaction(parse(payload)?).await,
            WebhookKind::Appeal => self.process_appeal(parse(payload)?).await,
        }
    }

    #[instrument(skip_all, fields(merchant_transaction_id = %webhook.merchant_transaction_id))]
    pub async fn process_transaction(&self, webhook: TransactionWebhook) -> Result<WebhookAck> {
        let id = &webhook.merchant_transaction_id;
        info!(
            status = %webhook.status,
            paid_amount = %webhook.paid_amount,
            "transaction webhook received"
        );

        match &webhook.status {
            TransactionStatus::Paid => info!("transaction {id} paid in full"),
            TransactionStatus::Underpaid => warn!(
                expected = %webhook.amount,
                received = %webhook.paid_amount,
                "transaction {id} underpaid"
            ),
            TransactionStatus::Overpaid => warn!(
                expected = %webhook.amount,
                received = %webhook.paid_amount,
                "transaction {id} overpaid"
            ),
            TransactionStatus::Cancel => info!("transaction {id} canceled"),
            TransactionStatus::Expired => info!("transaction {id} expired"),
            TransactionStatus::Error => error!("transaction {id} failed"),
            TransactionStatus::Unknown(raw) => warn!("unknown status {raw} for transaction {id}"),
        }

        let update = TransactionStatusUpdate {
            merchant_transaction_id: webhook.merchant_transaction_id,
            status: webhook.status,
            paid_amount: webhook.paid_amount,
            currency_rate: webhook.currency_rate,
            amount_in_usd: webhook.amount_in_usd,
        };
        self.transaction_store
            .update_transaction_status(update)
            .await
            .map_err(processing_failed)?;

        Ok(WebhookAck::ok(TRANSACTION_ACK))
    }

    #[instrument(skip_all, fields(appeal_id = webhook.id))]
    pub async fn process_appeal(&self, webhook: AppealWebhook) -> Result<WebhookAck> {
        info!(
            status = %webhook.status,
            transaction_id = webhook.transaction_id,
            "appeal webhook received"
        );

        let appeal = AppealRef {
            appeal_id: webhook.id,
            transaction_id: webhook.transaction_id,
            merchant_transaction_id: webhook.merchant_transaction_id,
        };
        let reason = webhook.reason.as_deref();

        match webhook.status {
            AppealStatus::Canceled => {
                info!(reason = reason.unwrap_or_default(), "appeal {} canceled", appeal.appeal_id);
                self.appeal_store
                    .cancel_appeal(&appeal, reason)
                    .await
                    .map_err(processing_failed)?;
            }
            AppealStatus::Success => {
                info!("appeal {} approved", appeal.appeal_id);
                self.appeal_store
                    .approve_appeal(&appeal)
                    .await
                    .map_err(processing_failed)?;
            }
            AppealStatus::Process => info!("appeal {} in process", appeal.appeal_id),
        }

        self.appeal_store
            .update_appeal_status(appeal.appeal_id, webhook.status, reason)
            .await
            .map_err(processing_failed)?;

        Ok(WebhookAck::ok(APPEAL_ACK))
    }
}

fn parse<T: DeserializeOwned>(payload: Value) -> Result<T> {
    serde_json::from_value(payload).map_err(|e| {
        error!(error = %e, "webhook payload failed validation");
        GatewayError::validation(e.to_string())
    })
}

fn processing_failed(e: GatewayError) -> GatewayError {
    error!(error = %e, "webhook processing failed");
    GatewayError::Internal(format!("Error processing webhook: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signature::calculate_signature;
    use crate::infrastructure::in_memory::{InMemoryStore, StoreCall};
    use rust_decimal_macros::dec;
    use serde_json::json;

    const URL: &str = "https://merchant.example/webhooks/appeal";
    const SECRET: &str = "secret";

    fn processor(store: &InMemoryStore) -> WebhookProcessor {
        WebhookProcessor::new(
            WebhookGuard::new(true, Some(SECRET.to_string())),
            Box::new(store.clone()),
            Box::new(store.clone()),
        )
    }

    fn transaction_webhook(status: &str) -> TransactionWebhook {
        TransactionWebhook {
            merchant_transaction_id: "order-1".to_string(),
            status: TransactionStatus::from(status),
            paid_amount: dec!(1000),
            amount: dec!(1000),
            currency_rate: dec!(90.5),
            amount_in_usd: dec!(11.05),
        }
    }

    #[tokio::test]
    async fn test_every_transaction_status_updates_once() {
        for status in ["paid", "underpaid", "overpaid", "cancel", "expired", "error", "mystery"] {
            let store = InMemoryStore::new();
            let ack = processor(&store)
                .process_transaction(transaction_webhook(status))
                .await
                .unwrap();

            assert_eq!(ack.message, TRANSACTION_ACK);
            let calls = store.calls().await;
            assert_eq!(calls.len(), 1, "status {status}");
            assert!(matches!(
                &calls[0],
                StoreCall::TransactionStatus(u) if u.status.as_str() == status
            ));
        }
    }

    #[tokio::test]
    async fn test_canceled_appeal_cancels_then_updates() {
        let store = InMemoryStore::new();
        let webhook = AppealWebhook {
            id: 9,
            transaction_id: 90,
            merchant_transaction_id: "order-9".to_string(),
            status: AppealStatus::Canceled,
            reason: Some("no receipt".to_string()),
        };

        let ack = processor(&store).process_appeal(webhook).await.unwrap();
        assert_eq!(ack, WebhookAck::ok(APPEAL_ACK));

        let calls = store.calls().await;
        assert_eq!(calls.len(), 2);
        assert!(matches!(
            &calls[0],
            StoreCall::CancelAppeal { appeal, reason }
                if appeal.appeal_id == 9 && reason.as_deref() == Some("no receipt")
        ));
        assert!(matches!(
            &calls[1],
            StoreCall::AppealStatus { appeal_id: 9, status: AppealStatus::Canceled, .. }
        ));
    }

    #[tokio::test]
    async fn test_process_appeal_only_updates_status() {
        let store = InMemoryStore::new();
        let webhook = AppealWebhook {
            id: 4,
            transaction_id: 40,
            merchant_transaction_id: "order-4".to_string(),
            status: AppealStatus::Process,
            reason: None,
        };
        processor(&store).process_appeal(webhook).await.unwrap();

        assert_eq!(
            store.calls().await,
            vec![StoreCall::AppealStatus {
                appeal_id: 4,
                status: AppealStatus::Process,
                reason: None
            }]
        );
    }

    #[tokio::test]
    async fn test_unknown_appeal_status_rejected_before_side_effects() {
        let store = InMemoryStore::new();
        let body = json!({
            "id": 1,
            "transaction_id": 2,
            "merchant_transaction_id": "order-1",
            "status": "unknown_value"
        });
        let signature = calculate_signature(URL, &body, SECRET).unwrap();
        let raw = serde_json::to_vec(&body).unwrap();

        let result = processor(&store)
            .handle(WebhookKind::Appeal, URL, &raw, Some(&signature))
            .await;

        assert!(matches!(result, Err(GatewayError::Validation { .. })));
        assert!(store.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_signed_transaction_delivery_with_unknown_status_is_accepted() {
        let store = InMemoryStore::new();
        let url = "https://merchant.example/webhooks/transaction";
        let body = json!({
            "merchant_transaction_id": "order-5",
            "status": "unknown_value",
            "paid_amount": "0",
            "amount": "500",
            "currency_rate": "90.5",
            "amount_in_usd": "5.52"
        });
        let signature = calculate_signature(url, &body, SECRET).unwrap();
        let raw = serde_json::to_vec(&body).unwrap();

        let ack = processor(&store)
            .handle(WebhookKind::Transaction, url, &raw, Some(&signature))
            .await
            .unwrap();

        assert_eq!(ack.status, "ok");
        let stored = store.transaction_status("order-5").await.unwrap();
        assert_eq!(stored.status, TransactionStatus::Unknown("unknown_value".to_string()));
    }

    #[test]
    fn test_webhook_kind_parsing() {
        assert_eq!("appeal".parse::<WebhookKind>().unwrap(), WebhookKind::Appeal);
        assert!("refund".parse::<WebhookKind>().is_err());
    }
}
