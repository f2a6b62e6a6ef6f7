//! Payer phone numbers in the supported carrier format.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// A Kenyan mobile number in the format the gateway accepts.
///
/// Exactly 12 digits: the `254` country prefix followed by a mobile
/// subscriber number starting with `7` or `1` (e.g. `254712345678`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Parses and validates a phone number.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let digits = raw.trim();
        let valid = digits.len() == 12
            && digits.starts_with("254")
            && matches!(digits.as_bytes()[3], b'7' | b'1')
            && digits.bytes().all(|b| b.is_ascii_digit());
        if valid {
            Ok(Self(digits.to_string()))
        } else {
            Err(DomainError::InvalidPhoneNumber(raw.to_string()))
        }
    }

    /// Returns the number as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
