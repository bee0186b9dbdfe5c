//! Conversions between the canonical models and the provider wire format.

use crate::domain::country::Country;
use crate::domain::money::{self, Rate};
use crate::domain::transaction::{
    BalanceResponse, CardDetails, Field, Instrument, LimitItem, LimitsResponse, PaymentDetails,
    SbpDetails, SimDetails, TransactionRequest, TransactionResponse,
};
use crate::error::{GatewayError, Result};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::warn;

/// How long a freshly created transaction stays payable.
pub const EXPIRY_WINDOW_MINUTES: i64 = 10;

/// Currency assumed when the provider does not report one.
pub const DEFAULT_CURRENCY: &str = "RUB";

#[derive(Debug, Deserialize)]
struct ProviderReply {
    result: ProviderResult,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProviderResult {
    id: i64,
    order_id: String,
    amount: Decimal,
    rate: Decimal,
    fee: Decimal,
    #[serde(default)]
    currency: Option<String>,
    address: String,
    recipient: String,
    bank_name: String,
    bank: String,
}

fn upstream<T: DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| GatewayError::UpstreamSchema(e.to_string()))
}

fn put(payload: &mut Map<String, Value>, key: &str, value: Option<Value>) {
    if let Some(value) = value {
        payload.insert(key.to_string(), value);
    }
}

fn decimal_field(field: &Field<Decimal>) -> Option<Value> {
    field.value().map(|d| Value::String(d.to_string()))
}

fn string_field(field: &Field<String>) -> Option<Value> {
    field.value().map(|s| Value::String(s.clone()))
}

/// Builds the provider payload for `instrument`.
///
/// Absent and null optional fields are left out entirely; empty strings are kept.
pub fn to_provider(instrument: Instrument, request: &TransactionRequest) -> Map<String, Value> {
    let mut payload = Map::new();
    payload.insert("amount".to_string(), Value::String(request.amount.to_string()));
    payload.insert("currency".to_string(), Value::String(request.currency.clone()));
    payload.insert(
        "merchant_transaction_id".to_string(),
        Value::String(request.merchant_transaction_id.clone()),
    );
    if instrument.is_bank_routed() {
        put(&mut payload, "bank_name", string_field(&request.bank_name));
    }
    put(&mut payload, "rate", decimal_field(&request.rate));
    put(
        &mut payload,
        "currency_rate",
        decimal_field(&request.currency_rate),
    );
    put(&mut payload, "client_id", string_field(&request.client_id));
    payload
}

/// Reads a create-transaction reply into the canonical response.
///
/// Missing or mistyped keys, a missing payment link where one is expected and
/// a non-positive rate all yield [`GatewayError::UpstreamSchema`].
pub fn from_provider(
    instrument: Instrument,
    body: &str,
    received_at: DateTime<Utc>,
) -> Result<TransactionResponse> {
    let reply: ProviderReply = upstream(body)?;
    let result = reply.result;

    let rate = Rate::new(result.rate)?;
    let amount_in_usd = money::amount_in_usd(result.amount, rate)?;
    let commission = money::commission(result.fee, result.amount)?;
    let currency = result
        .currency
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

    let payment_link = if instrument.has_payment_link() {
        let link = reply.url.ok_or_else(|| {
            GatewayError::UpstreamSchema("missing field `url`".to_string())
        })?;
        Some(link)
    } else {
        None
    };

    let details = match instrument {
        Instrument::Card
        | Instrument::CardInternal
        | Instrument::CardCrossBorder
        | Instrument::Qr => PaymentDetails::Card(CardDetails {
            card_number: result.address,
            owner_name: result.recipient,
            bank_name: result.bank_name,
            country_name: Country::from_bank_code(&result.bank),
            payment_currency: currency.clone(),
            payment_link,
        }),
        Instrument::Sbp | Instrument::SbpInternal | Instrument::SbpCrossBorder => {
            PaymentDetails::Sbp(SbpDetails {
                phone_number: result.address,
                owner_name: result.recipient,
                bank_name: result.bank_name,
                country_name: Country::from_bank_code(&result.bank),
                payment_currency: currency.clone(),
                payment_link,
            })
        }
        Instrument::Sim => PaymentDetails::Sim(SimDetails {
            phone_number: result.address,
            owner_name: result.recipient,
            operator: result.bank_name,
        }),
    };

    Ok(TransactionResponse {
        id: result.id,
        merchant_transaction_id: result.order_id,
        expires_at: received_at + Duration::minutes(EXPIRY_WINDOW_MINUTES),
        amount: result.amount,
        currency,
        currency_rate: rate.value(),
        amount_in_usd,
        rate: result.fee,
        commission,
        details,
    })
}

pub fn balance_from_provider(body: &str) -> Result<BalanceResponse> {
    upstream(body)
}

/// Keeps only the instruments reported as objects carrying two decimal bounds.
///
/// A malformed entry is dropped on its own; the other instruments still come through.
pub fn limits_from_value(value: &Value) -> Result<LimitsResponse> {
    let Some(object) = value.as_object() else {
        return Err(GatewayError::UpstreamSchema("limits reply is not an object".to_string()));
    };

    let item = |key: &str| -> Option<LimitItem> {
        let entry = object.get(key)?.as_object()?;
        let (min, max) = (entry.get("min_amount")?, entry.get("max_amount")?);
        let bound = |v: &Value| serde_json::from_value::<Decimal>(v.clone());
        match (bound(min), bound(max)) {
            (Ok(min_amount), Ok(max_amount)) => Some(LimitItem {
                min_amount,
                max_amount,
            }),
            (Err(e), _) | (_, Err(e)) => {
                warn!(instrument = key, error = %e, "skipping malformed limit entry");
                None
            }
        }
    };

    Ok(LimitsResponse {
        card: item("card"),
        sbp: item("sbp"),
        qr: item("qr"),
        sim: item("sim"),
    })
}

pub fn limits_from_provider(body: &str) -> Result<LimitsResponse> {
    let value: Value = upstream(body)?;
    limits_from_value(&value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn provider_body(with_url: bool) -> String {
        let mut body = json!({
            "result": {
                "id": 555,
                "orderId": "order-1",
                "amount": 1000,
                "rate": 90.5,
                "fee": "0.05",
                "address": "2200 0000 0000 0001",
                "recipient": "Ivan Petrov",
                "bankName": "Sberbank",
                "bank": "sberbank"
            }
        });
        if with_url {
            body["url"] = json!("https://pay.provider.com/p/555");
        }
        body.to_string()
    }

    fn received_at() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_to_provider_drops_absent_and_null_keeps_empty() {
        let mut request = TransactionRequest::new("order-1", dec!(1000.50), "RUB");
        request.rate = Field::Null;
        request.client_id = Field::Present(String::new());
        request.currency_rate = Field::Present(dec!(90.5));

        let payload = to_provider(Instrument::Card, &request);
        let keys: Vec<&str> = payload.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            ["amount", "currency", "merchant_transaction_id", "currency_rate", "client_id"]
        );
        assert_eq!(payload["amount"], json!("1000.50"));
        assert_eq!(payload["client_id"], json!(""));
    }

    #[test]
    fn test_bank_name_only_sent_for_bank_routed() {
        let mut request = TransactionRequest::new("order-1", dec!(10), "RUB");
        request.bank_name = Field::Present("tinkoff".to_string());

        assert!(!to_provider(Instrument::Card, &request).contains_key("bank_name"));
        assert_eq!(
            to_provider(Instrument::SbpInternal, &request)["bank_name"],
            json!("tinkoff")
        );
    }

    #[test]
    fn test_from_provider_card() {
        let response =
            from_provider(Instrument::Card, &provider_body(true), received_at()).unwrap();

        assert_eq!(response.id, 555);
        assert_eq!(response.merchant_transaction_id, "order-1");
        assert_eq!(response.currency, "RUB");
        assert_eq!(response.currency_rate, dec!(90.5));
        assert_eq!(response.amount_in_usd, dec!(11.05));
        assert_eq!(response.rate, dec!(0.05));
        assert_eq!(response.commission, dec!(50.00));
        assert_eq!(response.expires_at, received_at() + Duration::minutes(10));

        let PaymentDetails::Card(card) = &response.details else {
            panic!("expected card details");
        };
        assert_eq!(card.country_name, Country::Russia);
        assert_eq!(card.payment_link.as_deref(), Some("https://pay.provider.com/p/555"));

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["card_number"], json!("2200 0000 0000 0001"));
        assert_eq!(json["country_name"], json!("Russia"));
        assert_eq!(json["amount_in_usd"], json!("11.05"));
    }

    #[test]
    fn test_internal_variant_has_no_payment_link() {
        let response =
            from_provider(Instrument::SbpInternal, &provider_body(false), received_at()).unwrap();
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["phone_number"], json!("2200 0000 0000 0001"));
        assert!(json.get("payment_link").is_none());
    }

    #[test]
    fn test_sim_details() {
        let response =
            from_provider(Instrument::Sim, &provider_body(false), received_at()).unwrap();
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["operator"], json!("Sberbank"));
        assert!(json.get("country_name").is_none());
    }

    #[test]
    fn test_missing_keys_are_upstream_schema_errors() {
        let body = json!({"result": {"id": 1}}).to_string();
        let err = from_provider(Instrument::Card, &body, received_at()).unwrap_err();
        assert!(matches!(err, GatewayError::UpstreamSchema(_)));
        assert_eq!(err.envelope().message, "unknown provider response");

        let err = from_provider(Instrument::Qr, &provider_body(false), received_at()).unwrap_err();
        assert!(matches!(err, GatewayError::UpstreamSchema(_)));

        let err = from_provider(Instrument::Card, "<html>", received_at()).unwrap_err();
        assert!(matches!(err, GatewayError::UpstreamSchema(_)));
    }

    #[test]
    fn test_zero_rate_is_rejected() {
        let body = provider_body(true).replace("90.5", "0");
        let err = from_provider(Instrument::Card, &body, received_at()).unwrap_err();
        assert!(matches!(err, GatewayError::UpstreamSchema(_)));
    }

    #[test]
    fn test_limits_keep_only_complete_entries() {
        let value = json!({
            "card": {"min_amount": "100", "max_amount": 200000},
            "sbp": {"min_amount": "100"},
            "qr": "n/a",
            "sim": {"min_amount": 50, "max_amount": "5000"}
        });
        let limits = limits_from_value(&value).unwrap();
        assert_eq!(limits.card.unwrap().max_amount, dec!(200000));
        assert!(limits.sbp.is_none());
        assert!(limits.qr.is_none());
        assert_eq!(limits.sim.unwrap().min_amount, dec!(50));
    }

    #[test]
    fn test_malformed_limit_entry_does_not_sink_the_others() {
        let value = json!({
            "card": {"min_amount": null, "max_amount": 100},
            "sbp": {"min_amount": "10", "max_amount": "50000"},
            "qr": {"min_amount": "abc", "max_amount": "10"}
        });
        let limits = limits_from_value(&value).unwrap();
        assert!(limits.card.is_none());
        assert!(limits.qr.is_none());
        assert_eq!(limits.sbp.unwrap().max_amount, dec!(50000));

        assert!(matches!(
            limits_from_value(&json!([1, 2])),
            Err(GatewayError::UpstreamSchema(_))
        ));
    }

    #[test]
    fn test_balance_requires_both_fields() {
        let ok =
            balance_from_provider(r#"{"balance": "10.00", "currency_rate": "90.32"}"#).unwrap();
        assert_eq!(ok.balance, dec!(10.00));
        assert!(matches!(
            balance_from_provider(r#"{"balance": "10.00"}"#),
            Err(GatewayError::UpstreamSchema(_))
        ));
    }
}
