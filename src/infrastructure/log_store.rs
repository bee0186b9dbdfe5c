use crate::domain::ports::{AppealRef, AppealStore, TransactionStatusStore, TransactionStatusUpdate};
use crate::domain::webhook::AppealStatus;
use crate::error::Result;
use async_trait::async_trait;
use tracing::info;

/// Persistence stand-in that only logs what a real store would write.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogStore;

impl LogStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TransactionStatusStore for LogStore {
    async fn update_transaction_status(&self, update: TransactionStatusUpdate) -> Result<()> {
        info!(
            merchant_transaction_id = %update.merchant_transaction_id,
            status = %update.status,
            paid_amount = %update.paid_amount,
            currency_rate = %update.currency_rate,
            amount_in_usd = %update.amount_in_usd,
            "updating transaction status"
        );
        Ok(())
    }
}

#[async_trait]
impl AppealStore for LogStore {
    async fn cancel_appeal(&self, appeal: &AppealRef, reason: Option<&str>) -> Result<()> {
        info!(
            appeal_id = appeal.appeal_id,
            transaction_id = appeal.transaction_id,
            merchant_transaction_id = %appeal.merchant_transaction_id,
            reason = reason.unwrap_or_default(),
            "handling canceled appeal"
        );
        Ok(())
    }

    async fn approve_appeal(&self, appeal: &AppealRef) -> Result<()> {
        info!(
            appeal_id = appeal.appeal_id,
            transaction_id = appeal.transaction_id,
            merchant_transaction_id = %appeal.merchant_transaction_id,
            "handling approved appeal"
        );
        Ok(())
    }

    async fn update_appeal_status(
        &self,
        appeal_id: i64,
        status: AppealStatus,
        reason: Option<&str>,
    ) -> Result<()> {
        info!(
            appeal_id,
            status = %status,
            reason = reason.unwrap_or_default(),
            "updating appeal status"
        );
        Ok(())
    }
}
