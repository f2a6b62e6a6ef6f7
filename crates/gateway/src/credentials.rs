//! Gateway configuration and credential derivation.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};

/// Which Daraja environment to target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Sandbox,
    Production,
}

impl Environment {
    /// Returns the base URL for this environment.
    pub fn base_url(&self) -> &'static str {
        match self {
            Environment::Sandbox => "https://sandbox.safaricom.co.ke",
            Environment::Production => "https://api.safaricom.co.ke",
        }
    }

    /// Parses an environment name, defaulting to sandbox for anything
    /// other than `"production"`.
    pub fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("production") {
            Environment::Production
        } else {
            Environment::Sandbox
        }
    }
}

/// Static configuration for the gateway client.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// OAuth consumer key for the credential exchange.
    pub consumer_key: String,
    /// OAuth consumer secret for the credential exchange.
    pub consumer_secret: String,
    /// Business shortcode (paybill number).
    pub short_code: String,
    /// Lipa-na-M-Pesa passkey used in password derivation.
    pub passkey: String,
    pub environment: Environment,
    /// Absolute URL the gateway delivers outcome callbacks to.
    pub callback_url: String,
}

/// Formats an initiation timestamp in the gateway's fixed 14-digit
/// `YYYYMMDDHHMMSS` format (second resolution).
pub fn derive_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y%m%d%H%M%S").to_string()
}

/// Derives the initiation password: base64 of shortcode + passkey + timestamp.
pub fn derive_password(short_code: &str, passkey: &str, timestamp: &str) -> String {
    BASE64.encode(format!("{short_code}{passkey}{timestamp}"))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_timestamp_is_fixed_14_digits() {
        let at = Utc.with_ymd_and_hms(2016, 2, 16, 16, 56, 27).unwrap();
        let ts = derive_timestamp(at);
        assert_eq!(ts, "20160216165627");
        assert_eq!(ts.len(), 14);
    }

    #[test]
    fn test_timestamp_pads_single_digit_fields() {
        let at = Utc.with_ymd_and_hms(2026, 1, 5, 3, 4, 9).unwrap();
        assert_eq!(derive_timestamp(at), "20260105030409");
    }

    #[test]
    fn test_password_is_base64_of_concatenation() {
        let password = derive_password("174379", "testpasskey", "20160216165627");
        let decoded = BASE64.decode(&password).unwrap();
        assert_eq!(decoded, b"174379testpasskey20160216165627");
    }

    #[test]
    fn test_environment_base_urls() {
        assert_eq!(
            Environment::from_name("production").base_url(),
            "https://api.safaricom.co.ke"
        );
        assert_eq!(
            Environment::from_name("sandbox").base_url(),
            "https://sandbox.safaricom.co.ke"
        );
        assert_eq!(Environment::from_name("anything"), Environment::Sandbox);
    }
}
