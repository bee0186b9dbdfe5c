use crate::error::{AuthFailure, GatewayError, Result};
use tracing::warn;

/// Checks an `Authorization` header value against the configured merchant token.
///
/// Only the `Bearer` scheme is accepted.
pub fn authorize(header: Option<&str>, merchant_token: &str) -> Result<()> {
    let header = header.map(str::trim).unwrap_or_default();
    let Some((scheme, token)) = header.split_once(' ') else {
        warn!("request without credentials");
        return Err(GatewayError::Auth(AuthFailure::MissingCredentials));
    };

    let token = token.trim();
    if token.is_empty() {
        warn!("request without credentials");
        return Err(GatewayError::Auth(AuthFailure::MissingCredentials));
    }
    if scheme != "Bearer" {
        warn!(scheme, "invalid authentication scheme");
        return Err(GatewayError::Auth(AuthFailure::InvalidScheme));
    }
    if merchant_token.is_empty() || token != merchant_token {
        warn!("token verification failed");
        return Err(GatewayError::Auth(AuthFailure::InvalidToken));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(header: Option<&str>) -> Option<AuthFailure> {
        match authorize(header, "merchant-token") {
            Err(GatewayError::Auth(failure)) => Some(failure),
            _ => None,
        }
    }

    #[test]
    fn test_accepts_matching_bearer() {
        assert!(authorize(Some("Bearer merchant-token"), "merchant-token").is_ok());
    }

    #[test]
    fn test_failure_classes() {
        assert_eq!(failure(None), Some(AuthFailure::MissingCredentials));
        assert_eq!(failure(Some("Bearer")), Some(AuthFailure::MissingCredentials));
        assert_eq!(failure(Some("Basic dXNlcjpwYXNz")), Some(AuthFailure::InvalidScheme));
        assert_eq!(failure(Some("Bearer wrong")), Some(AuthFailure::InvalidToken));
    }

    #[test]
    fn test_unset_merchant_token_rejects_everything() {
        assert!(authorize(Some("Bearer anything"), "").is_err());
    }
}
