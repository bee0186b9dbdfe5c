//! Folds every provider failure into [`GatewayError`].
//!
//! HTTP status failures keep the provider's message, network failures get a
//! fixed `503` shape with a class label, and everything else becomes `500`.

use crate::error::{GatewayError, NetworkFailure, UNKNOWN_PROVIDER_ERROR};
use serde_json::Value;
use std::fmt::Display;
use std::time::Duration;
use tracing::error;

/// Pulls `message` out of a JSON error body, falling back to the raw text.
pub fn extract_message(body: &str) -> Option<String> {
    let from_json = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| value.get("message").and_then(Value::as_str).map(str::to_string));
    match from_json {
        Some(message) => Some(message),
        None if body.trim().is_empty() => None,
        None => Some(body.to_string()),
    }
}

/// Provider answered with a non-2xx status.
pub fn from_status(status: u16, body: &str) -> GatewayError {
    error!(status, body, "provider returned an error status");
    GatewayError::ProviderStatus {
        status,
        message: extract_message(body).unwrap_or_else(|| UNKNOWN_PROVIDER_ERROR.to_string()),
    }
}

/// Maps a transport error onto its [`NetworkFailure`] class.
///
/// reqwest enforces a single deadline over the whole exchange, so a timeout
/// after the connection is up is reported as a read timeout.
pub fn classify(error: &reqwest::Error) -> NetworkFailure {
    if error.is_timeout() {
        if error.is_connect() {
            NetworkFailure::ConnectTimeout
        } else {
            NetworkFailure::ReadTimeout
        }
    } else if error.is_connect() {
        NetworkFailure::Connect
    } else if error.is_body() || error.is_decode() {
        NetworkFailure::Read
    } else if error.is_request() {
        NetworkFailure::Write
    } else {
        NetworkFailure::Other
    }
}

/// Transport failure while talking to the provider.
pub fn from_transport(error: reqwest::Error) -> GatewayError {
    if error.is_builder() {
        return unclassified(error);
    }
    let failure = classify(&error);
    error!(error = %error, kind = failure.label(), "network error contacting provider");
    GatewayError::Network {
        failure,
        detail: error.to_string(),
    }
}

/// No connection became free within the pool timeout.
pub fn pool_timeout(waited: Duration) -> GatewayError {
    error!(?waited, "no free provider connection");
    GatewayError::Network {
        failure: NetworkFailure::PoolTimeout,
        detail: format!("waited {waited:?} for a free connection"),
    }
}

/// Anything that fits no other class.
pub fn unclassified(error: impl Display) -> GatewayError {
    let message = error.to_string();
    error!(error = %message, "unexpected provider failure");
    GatewayError::Internal(message)
}
