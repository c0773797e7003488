use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use crate::error::AppError;
use crate::payments::{CardConfig, GatewayConfig};

/// Destinations handed to the hosted gateway and used for the buyer redirect.
#[derive(Clone, Debug)]
pub struct CheckoutUrls {
    /// Externally reachable base of this server; the gateway posts the
    /// confirmation callback here.
    pub public_base_url: String,
    /// Frontend base the buyer lands on after a confirmed payment.
    pub client_base_url: String,
    pub fail_url: String,
    pub cancel_url: String,
    pub ipn_url: String,
}

impl CheckoutUrls {
    pub fn new_from_env() -> Self {
        let public_base_url = trim_base(var_or("PUBLIC_BASE_URL", "http://localhost:5000"));
        let client_base_url = trim_base(var_or("CLIENT_BASE_URL", "http://localhost:5173"));
        let fail_url = var_or("GATEWAY_FAIL_URL", &format!("{}/fail", client_base_url));
        let cancel_url = var_or("GATEWAY_CANCEL_URL", &format!("{}/cancel", client_base_url));
        let ipn_url = var_or("GATEWAY_IPN_URL", &format!("{}/ipn", client_base_url));

        Self {
            public_base_url,
            client_base_url,
            fail_url,
            cancel_url,
            ipn_url,
        }
    }

    /// Where the gateway sends the buyer (and the confirmation) after payment.
    pub fn confirm_url(&self, transaction_id: &str) -> String {
        format!("{}/gateway-sessions/{}/confirm", self.public_base_url, transaction_id)
    }

    /// Frontend page shown once a gateway payment has been confirmed.
    pub fn success_redirect(&self, transaction_id: &str) -> String {
        format!("{}/payment/success/{}", self.client_base_url, transaction_id)
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub max_connections: u32,
    pub token_secret: String,
    pub card: CardConfig,
    pub gateway: GatewayConfig,
    pub urls: CheckoutUrls,
}

impl Config {
    pub fn new_from_env() -> Result<Self, AppError> {
        let bind_address = var_or("BIND_ADDRESS", "0.0.0.0:5000")
            .parse::<SocketAddr>()
            .map_err(|e| AppError::Config(format!("BIND_ADDRESS is invalid: {}", e)))?;
        let database_url = var_or("DATABASE_URL", "sqlite://classhub.db?mode=rwc");
        let max_connections = parse_var("DATABASE_MAX_CONNECTIONS", 5)?;
        let token_secret = required("ACCESS_TOKEN_SECRET")?;

        Ok(Self {
            bind_address,
            database_url,
            max_connections,
            token_secret,
            card: CardConfig::new_from_env()?,
            gateway: GatewayConfig::new_from_env()?,
            urls: CheckoutUrls::new_from_env(),
        })
    }
}

/// Bound applied to every outbound payment provider call.
pub fn provider_timeout() -> Result<Duration, AppError> {
    parse_var("PROVIDER_TIMEOUT_SECS", 15u64).map(Duration::from_secs)
}

pub(crate) fn required(key: &str) -> Result<String, AppError> {
    env::var(key).map_err(|_| AppError::Config(format!("{} is not set", key)))
}

pub(crate) fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub(crate) fn parse_var<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| AppError::Config(format!("{} is invalid: {}", key, e))),
        Err(_) => Ok(default),
    }
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls() -> CheckoutUrls {
        CheckoutUrls {
            public_base_url: "http://api.local".to_string(),
            client_base_url: "http://app.local".to_string(),
            fail_url: "http://app.local/fail".to_string(),
            cancel_url: "http://app.local/cancel".to_string(),
            ipn_url: "http://app.local/ipn".to_string(),
        }
    }

    #[test]
    fn confirm_url_points_at_standing_callback() {
        assert_eq!(
            urls().confirm_url("abc123"),
            "http://api.local/gateway-sessions/abc123/confirm"
        );
    }

    #[test]
    fn success_redirect_points_at_frontend() {
        assert_eq!(
            urls().success_redirect("abc123"),
            "http://app.local/payment/success/abc123"
        );
    }

    #[test]
    fn trailing_slash_is_dropped() {
        assert_eq!(trim_base("http://a.local/".to_string()), "http://a.local");
    }
}
