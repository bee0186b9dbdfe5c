use super::webhook::{AppealStatus, TransactionStatus};
use crate::error::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;

/// Values persisted whenever a transaction webhook is accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionStatusUpdate {
    pub merchant_transaction_id: String,
    pub status: TransactionStatus,
    pub paid_amount: Decimal,
    pub currency_rate: Decimal,
    pub amount_in_usd: Decimal,
}

/// Identifies the appeal and the transaction it disputes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppealRef {
    pub appeal_id: i64,
    pub transaction_id: i64,
    pub merchant_transaction_id: String,
}

/// Persistence collaborator for transaction statuses.
///
/// Deliveries are not deduplicated before reaching this port; implementations
/// that need idempotency must provide it themselves.
#[async_trait]
pub trait TransactionStatusStore: Send + Sync {
    async fn update_transaction_status(&self, update: TransactionStatusUpdate) -> Result<()>;
}

/// Side-effect collaborators of the appeal state machine.
#[async_trait]
pub trait AppealStore: Send + Sync {
    async fn cancel_appeal(&self, appeal: &AppealRef, reason: Option<&str>) -> Result<()>;
    async fn approve_appeal(&self, appeal: &AppealRef) -> Result<()>;
    async fn update_appeal_status(
        &self,
        appeal_id: i64,
        status: AppealStatus,
        reason: Option<&str>,
    ) -> Result<()>;
}

pub type TransactionStatusStoreBox = Box<dyn TransactionStatusStore>;
pub type AppealStoreBox = Box<dyn AppealStore>;
