#![allow(dead_code)]

use paygate::config::ChannelConfig;
use paygate::infrastructure::provider::ProviderClient;
use paygate::infrastructure::provider::channel::HttpChannel;
use serde_json::{Value, json};
use std::time::Duration;
use url::Url;

pub const API_KEY: &str = "provider-test-key";

/// A create-transaction reply as the provider sends it.
pub fn provider_transaction(id: i64, order_id: &str, bank: &str) -> Value {
    json!({
        "result": {
            "id": id,
            "orderId": order_id,
            "amount": 1000,
            "rate": 90.5,
            "fee": 0.05,
            "currency": "RUB",
            "address": "2200 1234 5678 9010",
            "recipient": "Ivan Petrov",
            "bankName": "Sberbank",
            "bank": bank
        },
        "url": format!("https://pay.provider.com/p/{id}")
    })
}

pub fn transaction_request(order_id: &str) -> Value {
    json!({
        "merchant_transaction_id": order_id,
        "amount": "1000",
        "currency": "RUB",
        "client_id": "client-7"
    })
}

pub fn client_with(base: &str, config: ChannelConfig) -> ProviderClient {
    let channel = HttpChannel::new(&config).unwrap();
    ProviderClient::new(channel, Url::parse(base).unwrap(), API_KEY, false)
}

pub fn client(base: &str) -> ProviderClient {
    client_with(base, ChannelConfig::default())
}

pub fn short_timeouts() -> ChannelConfig {
    ChannelConfig {
        timeout: Duration::from_millis(300),
        connect_timeout: Duration::from_millis(200),
        pool_timeout: Duration::from_millis(200),
        ..ChannelConfig::default()
    }
}
