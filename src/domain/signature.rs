//! HMAC-SHA256 webhook signatures.
//!
//! The signed message is the compact JSON body followed by the URL path and,
//! when the URL has one, `?` plus the query string.

use crate::error::{GatewayError, Result};
use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;
use tracing::warn;
use url::Url;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the provider's signature on webhook deliveries.
pub const SIGNATURE_HEADER: &str = "X-Signature";

fn signing_input(url: &str, body: &Value) -> Result<String> {
    let json = serde_json::to_string(body)
        .map_err(|e| GatewayError::Internal(format!("cannot serialise webhook body: {e}")))?;

    // Relative URLs such as `/webhooks/transaction?x=1` are resolved against a
    // placeholder origin; only path and query take part in the signature.
    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse("http://localhost")
            .and_then(|base| base.join(url))
            .map_err(|e| GatewayError::Internal(format!("invalid webhook url: {e}")))?,
        Err(e) => return Err(GatewayError::Internal(format!("invalid webhook url: {e}"))),
    };

    let mut input = json;
    input.push_str(parsed.path());
    if let Some(query) = parsed.query() {
        input.push('?');
        input.push_str(query);
    }
    Ok(input)
}

fn keyed_mac(secret: &str) -> Result<HmacSha256> {
    HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| GatewayError::Internal(format!("invalid signing key: {e}")))
}

/// Computes the lowercase hex signature of `body` delivered to `url`.
pub fn calculate_signature(url: &str, body: &Value, secret: &str) -> Result<String> {
    let input = signing_input(url, body)?;
    let mut mac = keyed_mac(secret)?;
    mac.update(input.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Checks `signature_header` against the expected signature in constant time.
///
/// Never fails: a missing header or any error while computing the expected
/// value counts as a mismatch.
pub fn verify_signature(
    url: &str,
    body: &Value,
    signature_header: Option<&str>,
    secret: &str,
) -> bool {
    let Some(header) = signature_header.filter(|h| !h.is_empty()) else {
        warn!("webhook delivered without a signature");
        return false;
    };

    let Ok(provided) = hex::decode(header.trim().to_ascii_lowercase()) else {
        return false;
    };

    match signing_input(url, body).and_then(|input| {
        let mut mac = keyed_mac(secret)?;
        mac.update(input.as_bytes());
        Ok(mac)
    }) {
        Ok(mac) => mac.verify_slice(&provided).is_ok(),
        Err(e) => {
            warn!(error = %e, "failed to compute webhook signature");
            false
        }
    }
}
