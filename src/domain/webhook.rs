use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Transaction status reported by the provider.
///
/// Statuses outside the known set are kept verbatim in [`TransactionStatus::Unknown`]
/// instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionStatus {
    Paid,
    Underpaid,
    Overpaid,
    Cancel,
    Expired,
    Error,
    Unknown(String),
}

impl TransactionStatus {
    pub fn as_str(&self) -> &str {
        match self {
            TransactionStatus::Paid => "paid",
            TransactionStatus::Underpaid => "underpaid",
            TransactionStatus::Overpaid => "overpaid",
            TransactionStatus::Cancel => "cancel",
            TransactionStatus::Expired => "expired",
            TransactionStatus::Error => "error",
            TransactionStatus::Unknown(raw) => raw,
        }
    }
}

impl From<&str> for TransactionStatus {
    fn from(value: &str) -> Self {
        match value {
            "paid" => TransactionStatus::Paid,
            "underpaid" => TransactionStatus::Underpaid,
            "overpaid" => TransactionStatus::Overpaid,
            "cancel" => TransactionStatus::Cancel,
            "expired" => TransactionStatus::Expired,
            "error" => TransactionStatus::Error,
            other => TransactionStatus::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TransactionStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(TransactionStatus::from(raw.as_str()))
    }
}

impl Serialize for TransactionStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// Provider notification about a transaction status change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionWebhook {
    pub merchant_transaction_id: String,
    pub status: TransactionStatus,
    pub paid_amount: Decimal,
    pub amount: Decimal,
    pub currency_rate: Decimal,
    pub amount_in_usd: Decimal,
}

/// Appeal lifecycle: `process` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppealStatus {
    Process,
    Success,
    Canceled,
}

impl AppealStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AppealStatus::Process => "process",
            AppealStatus::Success => "success",
            AppealStatus::Canceled => "canceled",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, AppealStatus::Process)
    }
}

impl fmt::Display for AppealStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider notification about an appeal status change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppealWebhook {
    pub id: i64,
    pub transaction_id: i64,
    pub merchant_transaction_id: String,
    pub status: AppealStatus,
    #[serde(default)]
    pub reason: Option<String>,
}

/// `{status: "ok", message}` body returned once a webhook has been handled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookAck {
    pub status: String,
    pub message: String,
}

impl WebhookAck {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            message: message.into(),
        }
    }
}
