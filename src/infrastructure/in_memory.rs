use crate::domain::ports::{AppealRef, AppealStore, TransactionStatusStore, TransactionStatusUpdate};
use crate::domain::webhook::AppealStatus;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// One collaborator invocation, as seen by [`InMemoryStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    TransactionStatus(TransactionStatusUpdate),
    CancelAppeal {
        appeal: AppealRef,
        reason: Option<String>,
    },
    ApproveAppeal(AppealRef),
    AppealStatus {
        appeal_id: i64,
        status: AppealStatus,
        reason: Option<String>,
    },
}

/// A thread-safe in-memory implementation of both persistence ports.
///
/// Keeps the latest status per transaction and per appeal, and records every
/// call in arrival order. Clones share state, so a test can hand one clone to
/// the webhook processor and inspect another.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    calls: Arc<RwLock<Vec<StoreCall>>>,
    transactions: Arc<RwLock<HashMap<String, TransactionStatusUpdate>>>,
    appeals: Arc<RwLock<HashMap<i64, AppealStatus>>>,
}

impl InMemoryStore {
    /// Creates a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every recorded call, oldest first.
    pub async fn calls(&self) -> Vec<StoreCall> {
        self.calls.read().await.clone()
    }

    pub async fn transaction_status(
        &self,
        merchant_transaction_id: &str,
    ) -> Option<TransactionStatusUpdate> {
        self.transactions
            .read()
            .await
            .get(merchant_transaction_id)
            .cloned()
    }

    pub async fn appeal_status(&self, appeal_id: i64) -> Option<AppealStatus> {
        self.appeals.read().await.get(&appeal_id).copied()
    }

    async fn record(&self, call: StoreCall) {
        self.calls.write().await.push(call);
    }
}

#[async_trait]
impl TransactionStatusStore for InMemoryStore {
    async fn update_transaction_status(&self, update: TransactionStatusUpdate) -> Result<()> {
        self.transactions
            .write()
            .await
            .insert(update.merchant_transaction_id.clone(), update.clone());
        self.record(StoreCall::TransactionStatus(update)).await;
        Ok(())
    }
}

#[async_trait]
impl AppealStore for InMemoryStore {
    async fn cancel_appeal(&self, appeal: &AppealRef, reason: Option<&str>) -> Result<()> {
        self.record(StoreCall::CancelAppeal {
            appeal: appeal.clone(),
            reason: reason.map(str::to_string),
        })
        .await;
        Ok(())
    }

    async fn approve_appeal(&self, appeal: &AppealRef) -> Result<()> {
        self.record(StoreCall::ApproveAppeal(appeal.clone())).await;
        Ok(())
    }

    async fn update_appeal_status(
        &self,
        appeal_id: i64,
        status: AppealStatus,
        reason: Option<&str>,
    ) -> Result<()> {
        self.appeals.write().await.insert(appeal_id, status);
        self.record(StoreCall::AppealStatus {
            appeal_id,
            status,
            reason: reason.map(str::to_string),
        })
        .await;
        Ok(())
    }
}
