//! Runtime configuration.
//!
//! Every setting can come from a command-line flag or from the environment
//! variable named next to it.

use crate::application::ingestion::WebhookGuard;
use crate::error::{GatewayError, Result};
use clap::Args;
use clap::builder::BoolishValueParser;
use std::time::Duration;
use url::Url;

pub const DEFAULT_PROVIDER_BASE_URL: &str = "https://api.provider.com";

/// Settings shared by every command.
#[derive(Debug, Clone, Args)]
pub struct Settings {
    /// Bearer token merchants must present.
    #[arg(long, env = "MERCHANT_TOKEN", default_value = "", hide_env_values = true)]
    pub merchant_token: String,

    /// Base URL of the payment provider API.
    #[arg(long, env = "PROVIDER_BASE_URL", default_value = DEFAULT_PROVIDER_BASE_URL)]
    pub provider_base_url: Url,

    /// Bearer credential sent to the provider.
    #[arg(long, env = "PROVIDER_API_KEY", default_value = "", hide_env_values = true)]
    pub provider_api_key: String,

    /// Accept provider webhooks.
    #[arg(long, env = "WEBHOOK_ENABLED", value_parser = BoolishValueParser::new())]
    pub webhook_enabled: bool,

    /// Shared secret for webhook signatures.
    #[arg(long, env = "WEBHOOK_SECRET_KEY", hide_env_values = true)]
    pub webhook_secret_key: Option<String>,

    /// Sandbox mode: balance and limits answer with canned data.
    #[arg(long, env = "DEBUG", value_parser = BoolishValueParser::new())]
    pub debug: bool,

    #[command(flatten)]
    pub channel: ChannelConfig,
}

impl Settings {
    pub fn webhook_guard(&self) -> WebhookGuard {
        WebhookGuard::new(self.webhook_enabled, self.webhook_secret_key.clone())
    }
}

/// Outbound HTTP channel parameters.
#[derive(Debug, Clone, Args)]
pub struct ChannelConfig {
    /// Upper bound on concurrent provider connections.
    #[arg(long, env = "PROVIDER_MAX_CONNECTIONS", default_value_t = 100)]
    pub max_connections: usize,

    /// Idle keep-alive connections retained per host.
    #[arg(long, env = "PROVIDER_MAX_IDLE_CONNECTIONS", default_value_t = 20)]
    pub max_idle_connections: usize,

    /// Overall request timeout, in seconds.
    #[arg(
        long = "provider-timeout",
        env = "PROVIDER_TIMEOUT",
        default_value = "30",
        value_parser = parse_secs
    )]
    pub timeout: Duration,

    /// Connection establishment timeout, in seconds.
    #[arg(
        long = "provider-connect-timeout",
        env = "PROVIDER_CONNECT_TIMEOUT",
        default_value = "5",
        value_parser = parse_secs
    )]
    pub connect_timeout: Duration,

    /// How long a call may wait for a free connection, in seconds.
    #[arg(
        long = "provider-pool-timeout",
        env = "PROVIDER_POOL_TIMEOUT",
        default_value = "30",
        value_parser = parse_secs
    )]
    pub pool_timeout: Duration,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            max_connections: 100,
            max_idle_connections: 20,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
            pool_timeout: Duration::from_secs(30),
        }
    }
}

impl ChannelConfig {
    /// Rejects zero limits and a connect timeout longer than the overall one.
    pub fn validate(&self) -> Result<()> {
        if self.max_connections == 0 {
            return Err(GatewayError::Misconfigured(
                "max_connections must be at least 1".to_string(),
            ));
        }
        if self.timeout.is_zero() || self.connect_timeout.is_zero() || self.pool_timeout.is_zero()
        {
            return Err(GatewayError::Misconfigured(
                "provider timeouts must be non-zero".to_string(),
            ));
        }
        if self.connect_timeout > self.timeout {
            return Err(GatewayError::Misconfigured(
                "connect timeout cannot exceed the overall timeout".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_secs(value: &str) -> std::result::Result<Duration, String> {
    let secs: f64 = value
        .parse()
        .map_err(|_| format!("`{value}` is not a number of seconds"))?;
    Duration::try_from_secs_f64(secs).map_err(|e| e.to_string())
}
