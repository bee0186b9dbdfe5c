use crate::domain::signature::verify_signature;
use crate::error::{AuthFailure, GatewayError, Result};
use serde_json::Value;
use tracing::warn;

/// Admission checks every inbound webhook passes before its payload is looked at.
#[derive(Debug, Clone)]
pub struct WebhookGuard {
    enabled: bool,
    secret: Option<String>,
}

impl WebhookGuard {
    /// An empty secret counts as not configured.
    pub fn new(enabled: bool, secret: Option<String>) -> Self {
        Self {
            enabled,
            secret: secret.filter(|s| !s.is_empty()),
        }
    }

    /// Runs the checks in order and returns the parsed body.
    ///
    /// 1. processing enabled, else `Forbidden`
    /// 2. secret configured, else `Misconfigured`
    /// 3. body is JSON, else `MalformedBody`
    /// 4. signature present, else `Auth(MissingSignature)`
    /// 5. signature valid, else `Auth(InvalidSignature)`
    pub fn admit(&self, url: &str, body: &[u8], signature: Option<&str>) -> Result<Value> {
        if !self.enabled {
            return Err(GatewayError::Forbidden("Webhook processing is disabled".to_string()));
        }

        let Some(secret) = self.secret.as_deref() else {
            return Err(GatewayError::Misconfigured(
                "Webhook secret key is not configured".to_string(),
            ));
        };

        let payload: Value = serde_json::from_slice(body)
            .map_err(|e| GatewayError::MalformedBody(e.to_string()))?;

        let Some(signature) = signature.filter(|s| !s.is_empty()) else {
            return Err(GatewayError::Auth(AuthFailure::MissingSignature));
        };

        if !verify_signature(url, &payload, Some(signature), secret) {
            warn!(url, "webhook signature mismatch");
            return Err(GatewayError::Auth(AuthFailure::InvalidSignature));
        }

        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signature::calculate_signature;
    use serde_json::json;

    const URL: &str = "/webhooks/transaction";

    fn signed(body: &Value) -> String {
        calculate_signature(URL, body, "secret").unwrap()
    }

    #[test]
    fn test_disabled_wins_over_everything() {
        let guard = WebhookGuard::new(false, None);
        let result = guard.admit(URL, b"not json", None);
        assert!(matches!(result, Err(GatewayError::Forbidden(_))));
    }

    #[test]
    fn test_missing_secret_is_misconfiguration() {
        let guard = WebhookGuard::new(true, Some(String::new()));
        let result = guard.admit(URL, b"{}", Some("00"));
        assert!(matches!(result, Err(GatewayError::Misconfigured(_))));
    }

    #[test]
    fn test_malformed_json_checked_before_signature() {
        let guard = WebhookGuard::new(true, Some("secret".to_string()));
        let result = guard.admit(URL, b"{oops", None);
        assert!(matches!(result, Err(GatewayError::MalformedBody(_))));
    }

    #[test]
    fn test_signature_checks() {
        let guard = WebhookGuard::new(true, Some("secret".to_string()));
        let body = json!({"status": "paid"});
        let raw = serde_json::to_vec(&body).unwrap();

        assert!(matches!(
            guard.admit(URL, &raw, None),
            Err(GatewayError::Auth(AuthFailure::MissingSignature))
        ));
        assert!(matches!(
            guard.admit(URL, &raw, Some("deadbeef")),
            Err(GatewayError::Auth(AuthFailure::InvalidSignature))
        ));
        assert_eq!(guard.admit(URL, &raw, Some(&signed(&body))).unwrap(), body);
    }
}
