//! Application configuration loaded from environment variables.

use gateway::{Environment, GatewayConfig};

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `JWT_SECRET` — HS256 signing secret for bearer tokens
/// - `MPESA_CONSUMER_KEY` / `MPESA_CONSUMER_SECRET` — gateway credentials
/// - `MPESA_SHORT_CODE` / `MPESA_PASSKEY` — paybill shortcode and passkey
/// - `MPESA_ENVIRONMENT` — `"sandbox"` (default) or `"production"`
/// - `CALLBACK_BASE_URL` — public base URL callbacks are delivered to
/// - `RESERVATION_TTL_SECS` — age before an unfinalized reservation is
///   released (default: 900)
/// - `SWEEP_INTERVAL_SECS` — reservation sweep cadence (default: 60)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub jwt_secret: String,
    pub mpesa_consumer_key: String,
    pub mpesa_consumer_secret: String,
    pub mpesa_short_code: String,
    pub mpesa_passkey: String,
    pub mpesa_environment: String,
    pub callback_base_url: String,
    pub reservation_ttl_secs: u64,
    pub sweep_interval_secs: u64,
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            host: env_or("HOST", "0.0.0.0"),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            log_level: env_or("RUST_LOG", "info"),
            jwt_secret: env_or("JWT_SECRET", "dev-secret"),
            mpesa_consumer_key: env_or("MPESA_CONSUMER_KEY", ""),
            mpesa_consumer_secret: env_or("MPESA_CONSUMER_SECRET", ""),
            mpesa_short_code: env_or("MPESA_SHORT_CODE", "174379"),
            mpesa_passkey: env_or("MPESA_PASSKEY", ""),
            mpesa_environment: env_or("MPESA_ENVIRONMENT", "sandbox"),
            callback_base_url: env_or("CALLBACK_BASE_URL", "http://localhost:3000"),
            reservation_ttl_secs: std::env::var("RESERVATION_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(900),
            sweep_interval_secs: std::env::var("SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Builds the gateway client configuration, including the absolute
    /// callback URL the gateway will deliver outcomes to.
    pub fn gateway(&self) -> GatewayConfig {
        GatewayConfig {
            consumer_key: self.mpesa_consumer_key.clone(),
            consumer_secret: self.mpesa_consumer_secret.clone(),
            short_code: self.mpesa_short_code.clone(),
            passkey: self.mpesa_passkey.clone(),
            environment: Environment::from_name(&self.mpesa_environment),
            callback_url: format!(
                "{}/api/payments/callback",
                self.callback_base_url.trim_end_matches('/')
            ),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            jwt_secret: "dev-secret".to_string(),
            mpesa_consumer_key: String::new(),
            mpesa_consumer_secret: String::new(),
            mpesa_short_code: "174379".to_string(),
            mpesa_passkey: String::new(),
            mpesa_environment: "sandbox".to_string(),
            callback_base_url: "http://localhost:3000".to_string(),
            reservation_ttl_secs: 900,
            sweep_interval_secs: 60,
        }
    }
}
