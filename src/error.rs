use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GatewayError>;

/// Message shown to callers whenever the provider answers with a payload we
/// cannot map onto the canonical schema.
pub const UNKNOWN_PROVIDER_RESPONSE: &str = "unknown provider response";

/// Fallback for unclassified failures that carry no text of their own.
pub const UNKNOWN_PROVIDER_ERROR: &str = "unknown provider error";

/// Why a caller or a webhook failed authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    MissingCredentials,
    InvalidScheme,
    InvalidToken,
    MissingSignature,
    InvalidSignature,
}

impl AuthFailure {
    pub fn code(self) -> &'static str {
        match self {
            AuthFailure::MissingCredentials => "AUTH_ERROR",
            AuthFailure::InvalidScheme => "AUTH_SCHEME_ERROR",
            AuthFailure::InvalidToken => "INVALID_TOKEN",
            AuthFailure::MissingSignature | AuthFailure::InvalidSignature => "401",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            AuthFailure::MissingCredentials => "Unauthorised",
            AuthFailure::InvalidScheme => "Invalid authentication scheme",
            AuthFailure::InvalidToken => "Invalid token",
            AuthFailure::MissingSignature => "Missing signature",
            AuthFailure::InvalidSignature => "Invalid signature",
        }
    }
}

/// Transport-level failure classes when talking to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkFailure {
    ConnectTimeout,
    ReadTimeout,
    PoolTimeout,
    Connect,
    Read,
    Write,
    Other,
}

impl NetworkFailure {
    /// Human readable label used in the caller-visible message.
    pub fn label(self) -> &'static str {
        match self {
            NetworkFailure::ConnectTimeout => "Connection timeout",
            NetworkFailure::ReadTimeout => "Response read timeout",
            NetworkFailure::PoolTimeout => "Timeout waiting for a free connection",
            NetworkFailure::Connect => "Connection error",
            NetworkFailure::Read => "Data read error",
            NetworkFailure::Write => "Data write error",
            NetworkFailure::Other => "Network error",
        }
    }
}

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        errors: BTreeMap<String, Vec<String>>,
    },
    #[error("Malformed request body: {0}")]
    MalformedBody(String),
    #[error("Authentication failed: {}", .0.message())]
    Auth(AuthFailure),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Server misconfiguration: {0}")]
    Misconfigured(String),
    #[error("Unexpected provider response: {0}")]
    UpstreamSchema(String),
    #[error("Provider rejected the request: {message}")]
    ProviderRejected { message: String },
    #[error("Provider returned HTTP {status}: {message}")]
    ProviderStatus { status: u16, message: String },
    #[error("{} while contacting provider: {detail}", .failure.label())]
    Network {
        failure: NetworkFailure,
        detail: String,
    },
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    pub fn validation(message: impl Into<String>) -> Self {
        GatewayError::Validation {
            message: message.into(),
            errors: BTreeMap::new(),
        }
    }

    /// HTTP status a boundary layer should answer with.
    pub fn http_status(&self) -> u16 {
        match self {
            GatewayError::Validation { .. } => 422,
            GatewayError::MalformedBody(_) => 400,
            GatewayError::Auth(_) => 401,
            GatewayError::Forbidden(_) => 403,
            GatewayError::Misconfigured(_) => 500,
            GatewayError::UpstreamSchema(_) => 520,
            GatewayError::ProviderRejected { .. } => 400,
            GatewayError::ProviderStatus { status, .. } => *status,
            GatewayError::Network { .. } => 503,
            GatewayError::Internal(_) => 500,
        }
    }

    /// Caller-visible shape of the error. Never carries internal detail beyond
    /// what the variant exposes on purpose.
    pub fn envelope(&self) -> ErrorEnvelope {
        match self {
            GatewayError::Validation { message, errors } => {
                ErrorEnvelope::new("422", message.clone()).with_errors(errors.clone())
            }
            GatewayError::MalformedBody(_) => ErrorEnvelope::new("400", "Invalid JSON format"),
            GatewayError::Auth(failure) => ErrorEnvelope::new(failure.code(), failure.message()),
            GatewayError::Forbidden(message) => ErrorEnvelope::new("403", message.clone()),
            GatewayError::Misconfigured(message) => ErrorEnvelope::new("500", message.clone()),
            GatewayError::UpstreamSchema(_) => {
                ErrorEnvelope::new("520", UNKNOWN_PROVIDER_RESPONSE)
            }
            GatewayError::ProviderRejected { message } => {
                ErrorEnvelope::new("400", message.clone())
            }
            GatewayError::ProviderStatus { status, message } => {
                ErrorEnvelope::new(status.to_string(), message.clone())
            }
            GatewayError::Network { failure, .. } => ErrorEnvelope::new(
                "503",
                format!("{} while contacting provider", failure.label()),
            ),
            GatewayError::Internal(message) if message.is_empty() => {
                ErrorEnvelope::new("500", UNKNOWN_PROVIDER_ERROR)
            }
            GatewayError::Internal(message) => ErrorEnvelope::new("500", message.clone()),
        }
    }
}

/// `{code, message, errors?}` body returned to callers on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorEnvelope {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, Vec<String>>>,
}

impl ErrorEnvelope {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            errors: None,
        }
    }

    /// Attaches field errors, but only when more than one field failed.
    pub fn with_errors(mut self, errors: BTreeMap<String, Vec<String>>) -> Self {
        if errors.len() > 1 {
            self.errors = Some(errors);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_omits_single_field_error() {
        let mut errors = BTreeMap::new();
        errors.insert("amount".to_string(), vec!["must be positive".to_string()]);
        let envelope = ErrorEnvelope::new("422", "invalid").with_errors(errors);
        assert!(envelope.errors.is_none());

        let json = serde_json::to_string(&envelope).unwrap();
        assert_eq!(json, r#"{"code":"422","message":"invalid"}"#);
    }

    #[test]
    fn test_envelope_keeps_multiple_field_errors() {
        let mut errors = BTreeMap::new();
        errors.insert("amount".to_string(), vec!["required".to_string()]);
        errors.insert("currency".to_string(), vec!["required".to_string()]);
        let envelope = ErrorEnvelope::new("422", "invalid").with_errors(errors);
        assert_eq!(envelope.errors.as_ref().map(|e| e.len()), Some(2));
    }

    #[test]
    fn test_network_envelope_has_fixed_code() {
        let error = GatewayError::Network {
            failure: NetworkFailure::ConnectTimeout,
            detail: "tcp connect timed out".to_string(),
        };
        let envelope = error.envelope();
        assert_eq!(envelope.code, "503");
        assert_eq!(envelope.message, "Connection timeout while contacting provider");
        assert_eq!(error.http_status(), 503);
        // Detail survives in the diagnostic rendering only.
        assert!(error.to_string().contains("tcp connect timed out"));
    }

    #[test]
    fn test_upstream_schema_hides_detail() {
        let error = GatewayError::UpstreamSchema("missing field `orderId`".to_string());
        let envelope = error.envelope();
        assert_eq!(envelope.code, "520");
        assert_eq!(envelope.message, UNKNOWN_PROVIDER_RESPONSE);
    }

    #[test]
    fn test_internal_without_text_uses_fallback() {
        let envelope = GatewayError::Internal(String::new()).envelope();
        assert_eq!(envelope.message, UNKNOWN_PROVIDER_ERROR);
    }

    #[test]
    fn test_auth_codes() {
        let envelope = GatewayError::Auth(AuthFailure::InvalidScheme).envelope();
        assert_eq!(envelope.code, "AUTH_SCHEME_ERROR");
        assert_eq!(GatewayError::Auth(AuthFailure::InvalidSignature).http_status(), 401);
    }
}
