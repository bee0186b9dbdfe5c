use crate::domain::country::Country;
use crate::error::{GatewayError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A request field that keeps "not sent", "sent as null" and "sent with a
/// value" apart. Use with `#[serde(default)]` so a missing key becomes
/// [`Field::Absent`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Field<T> {
    #[default]
    Absent,
    Null,
    Present(T),
}

impl<T> Field<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Field::Present(value) => Some(value),
            Field::Absent | Field::Null => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Field::Absent)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Field::Null)
    }
}

impl<T> From<Option<T>> for Field<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Field::Present(value),
            None => Field::Null,
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Field<T> {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Field::from)
    }
}

/// Payment instrument families the provider supports.
///
/// Internal variants route through a named bank; internal and cross-border
/// variants come back without a payment link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instrument {
    Card,
    CardInternal,
    CardCrossBorder,
    Sbp,
    SbpInternal,
    SbpCrossBorder,
    Qr,
    Sim,
}

impl Instrument {
    pub const ALL: [Instrument; 8] = [
        Instrument::Card,
        Instrument::CardInternal,
        Instrument::CardCrossBorder,
        Instrument::Sbp,
        Instrument::SbpInternal,
        Instrument::SbpCrossBorder,
        Instrument::Qr,
        Instrument::Sim,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Instrument::Card => "card",
            Instrument::CardInternal => "card-internal",
            Instrument::CardCrossBorder => "card-cross-border",
            Instrument::Sbp => "sbp",
            Instrument::SbpInternal => "sbp-internal",
            Instrument::SbpCrossBorder => "sbp-cross-border",
            Instrument::Qr => "qr",
            Instrument::Sim => "sim",
        }
    }

    /// Path segment of the provider endpoint that creates this kind of transaction.
    pub fn endpoint_segment(self) -> &'static str {
        match self {
            Instrument::Card | Instrument::CardInternal | Instrument::CardCrossBorder => "card",
            Instrument::Sbp | Instrument::SbpInternal | Instrument::SbpCrossBorder => "sbp",
            Instrument::Qr => "qr",
            Instrument::Sim => "sim",
        }
    }

    /// Whether the outbound payload names the bank the payment is routed through.
    pub fn is_bank_routed(self) -> bool {
        matches!(self, Instrument::CardInternal | Instrument::SbpInternal)
    }

    pub fn has_payment_link(self) -> bool {
        matches!(self, Instrument::Card | Instrument::Sbp | Instrument::Qr)
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Instrument {
    type Err = GatewayError;

    fn from_str(value: &str) -> Result<Self> {
        Instrument::ALL
            .into_iter()
            .find(|instrument| instrument.as_str() == value)
            .ok_or_else(|| GatewayError::validation(format!("unknown instrument: {value}")))
    }
}

/// Merchant-facing request to open a transaction.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TransactionRequest {
    pub merchant_transaction_id: String,
    pub amount: Decimal,
    pub currency: String,
    #[serde(default)]
    pub rate: Field<Decimal>,
    #[serde(default)]
    pub currency_rate: Field<Decimal>,
    #[serde(default)]
    pub client_id: Field<String>,
    #[serde(default)]
    pub bank_name: Field<String>,
}

impl TransactionRequest {
    pub fn new(
        merchant_transaction_id: impl Into<String>,
        amount: Decimal,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            merchant_transaction_id: merchant_transaction_id.into(),
            amount,
            currency: currency.into(),
            rate: Field::Absent,
            currency_rate: Field::Absent,
            client_id: Field::Absent,
            bank_name: Field::Absent,
        }
    }

    /// Checks the request against the rules of the chosen instrument.
    ///
    /// Every failing field is reported, keyed by field name.
    pub fn validate(&self, instrument: Instrument) -> Result<()> {
        let mut errors: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut fail = |field: &str, message: &str| {
            errors
                .entry(field.to_string())
                .or_default()
                .push(message.to_string());
        };

        if self.merchant_transaction_id.trim().is_empty() {
            fail("merchant_transaction_id", "must not be empty");
        }
        if self.amount <= Decimal::ZERO {
            fail("amount", "must be positive");
        }
        if self.currency.trim().is_empty() {
            fail("currency", "must not be empty");
        }
        if let Some(rate) = self.currency_rate.value()
            && *rate <= Decimal::ZERO
        {
            fail("currency_rate", "must be positive");
        }
        if instrument.is_bank_routed() && self.bank_name.value().is_none() {
            fail("bank_name", "is required for bank-routed instruments");
        }

        match errors.len() {
            0 => Ok(()),
            1 => {
                let message = errors
                    .iter()
                    .map(|(field, messages)| format!("{field}: {}", messages.join("; ")))
                    .collect::<String>();
                Err(GatewayError::Validation { message, errors })
            }
            _ => Err(GatewayError::Validation {
                message: "Request validation failed".to_string(),
                errors,
            }),
        }
    }
}

/// Canonical response for a created transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionResponse {
    pub id: i64,
    pub merchant_transaction_id: String,
    pub expires_at: DateTime<Utc>,
    pub amount: Decimal,
    pub currency: String,
    pub currency_rate: Decimal,
    pub amount_in_usd: Decimal,
    pub rate: Decimal,
    pub commission: Decimal,
    #[serde(flatten)]
    pub details: PaymentDetails,
}

/// Instrument-specific part of a [`TransactionResponse`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PaymentDetails {
    Card(CardDetails),
    Sbp(SbpDetails),
    Sim(SimDetails),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardDetails {
    pub card_number: String,
    pub owner_name: String,
    pub bank_name: String,
    pub country_name: Country,
    pub payment_currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SbpDetails {
    pub phone_number: String,
    pub owner_name: String,
    pub bank_name: String,
    pub country_name: Country,
    pub payment_currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimDetails {
    pub phone_number: String,
    pub owner_name: String,
    pub operator: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub balance: Decimal,
    pub currency_rate: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LimitItem {
    pub min_amount: Decimal,
    pub max_amount: Decimal,
}

/// Per-instrument amount limits. Instruments the provider did not report are left out.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct LimitsResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card: Option<LimitItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sbp: Option<LimitItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr: Option<LimitItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sim: Option<LimitItem>,
}
