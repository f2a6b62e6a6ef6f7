//! Wire types for the Daraja STK push API.

use chrono::{DateTime, Utc};
use domain::{CorrelationId, GatewayRecord, Money, PhoneNumber};
use serde::{Deserialize, Serialize};

use crate::credentials::{GatewayConfig, derive_password, derive_timestamp};

/// Business-level payment-initiation request built by the orchestrator.
#[derive(Debug, Clone)]
pub struct InitiateRequest {
    /// Order total; the wire request carries this rounded to whole units.
    pub amount: Money,
    /// The payer's phone number.
    pub phone: PhoneNumber,
    /// Order-derived account reference (`ORDER_<order-id>`).
    pub account_reference: String,
    /// Human-readable transaction description.
    pub description: String,
}

/// The STK push request as the gateway expects it on the wire.
#[derive(Debug, Clone, Serialize)]
pub struct StkPushRequest {
    #[serde(rename = "BusinessShortCode")]
    pub business_short_code: String,
    #[serde(rename = "Password")]
    pub password: String,
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    #[serde(rename = "TransactionType")]
    pub transaction_type: String,
    #[serde(rename = "Amount")]
    pub amount: i64,
    #[serde(rename = "PartyA")]
    pub party_a: String,
    #[serde(rename = "PartyB")]
    pub party_b: String,
    #[serde(rename = "PhoneNumber")]
    pub phone_number: String,
    #[serde(rename = "CallBackURL")]
    pub callback_url: String,
    #[serde(rename = "AccountReference")]
    pub account_reference: String,
    #[serde(rename = "TransactionDesc")]
    pub transaction_desc: String,
}

impl StkPushRequest {
    /// Builds the wire request from the business request and a fresh
    /// timestamp, deriving the password from the configured credentials.
    pub fn build(config: &GatewayConfig, request: &InitiateRequest, at: DateTime<Utc>) -> Self {
        let timestamp = derive_timestamp(at);
        let password = derive_password(&config.short_code, &config.passkey, &timestamp);
        Self {
            business_short_code: config.short_code.clone(),
            password,
            timestamp,
            transaction_type: "CustomerPayBillOnline".to_string(),
            amount: request.amount.round_to_units(),
            party_a: request.phone.as_str().to_string(),
            party_b: config.short_code.clone(),
            phone_number: request.phone.as_str().to_string(),
            callback_url: config.callback_url.clone(),
            account_reference: request.account_reference.clone(),
            transaction_desc: request.description.clone(),
        }
    }
}

/// The gateway's answer to an initiation request.
///
/// A non-`"0"` response code is a business-level rejection carried as
/// data; only transport and shape problems surface as errors.
#[derive(Debug, Clone)]
pub struct StkInitiation {
    /// The reconciliation key, when the gateway assigned one.
    pub correlation_id: Option<CorrelationId>,
    pub response_code: String,
    pub description: String,
    /// The full response body, kept for the payment's audit log.
    pub raw: serde_json::Value,
}

impl StkInitiation {
    /// Returns the correlation id if the gateway accepted the initiation.
    pub fn accepted(&self) -> Option<&CorrelationId> {
        if self.response_code == "0" {
            self.correlation_id.as_ref()
        } else {
            None
        }
    }

    /// Converts into the payment's audit-log record.
    pub fn to_record(&self) -> GatewayRecord {
        GatewayRecord::Initiation {
            response_code: self.response_code.clone(),
            description: self.description.clone(),
            raw: self.raw.clone(),
        }
    }

    /// Interprets a response body received with a 2xx status.
    pub fn from_body(raw: serde_json::Value) -> Self {
        let field = |name: &str| {
            raw.get(name)
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
        };
        Self {
            correlation_id: field("CheckoutRequestID").map(CorrelationId::new),
            response_code: field("ResponseCode").unwrap_or_default(),
            description: field("ResponseDescription").unwrap_or_default(),
            raw,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CallbackEnvelope {
    #[serde(rename = "Body")]
    body: CallbackBody,
}

#[derive(Debug, Deserialize)]
struct CallbackBody {
    #[serde(rename = "stkCallback")]
    stk_callback: StkCallbackWire,
}

#[derive(Debug, Deserialize)]
struct StkCallbackWire {
    #[serde(rename = "CheckoutRequestID")]
    checkout_request_id: String,
    #[serde(rename = "ResultCode")]
    result_code: i64,
    #[serde(rename = "ResultDesc", default)]
    result_desc: String,
    #[serde(rename = "CallbackMetadata", default)]
    callback_metadata: Option<CallbackMetadata>,
}

#[derive(Debug, Deserialize)]
struct CallbackMetadata {
    #[serde(rename = "Item", default)]
    items: Vec<MetadataItem>,
}

#[derive(Debug, Deserialize)]
struct MetadataItem {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Value", default)]
    value: Option<serde_json::Value>,
}

/// A parsed outcome notification.
///
/// The inbound payload is untrusted and possibly duplicated; parsing only
/// establishes shape, the reconciler establishes meaning.
#[derive(Debug, Clone)]
pub struct StkCallback {
    /// The `CheckoutRequestID` this outcome belongs to.
    pub correlation_id: CorrelationId,
    /// Zero means the payer completed the payment.
    pub result_code: i64,
    pub description: String,
    /// The payer's phone number from the callback metadata, if present.
    pub phone: Option<PhoneNumber>,
    /// The M-Pesa receipt number from the callback metadata, if present.
    pub receipt: Option<String>,
    /// The full payload, kept for the payment's audit log.
    pub raw: serde_json::Value,
}

impl StkCallback {
    /// Parses the documented envelope
    /// `{Body:{stkCallback:{CheckoutRequestID, ResultCode, ResultDesc,
    /// CallbackMetadata?}}}` out of a raw payload.
    pub fn from_payload(raw: serde_json::Value) -> Result<Self, serde_json::Error> {
        let envelope: CallbackEnvelope = serde_json::from_value(raw.clone())?;
        let callback = envelope.body.stk_callback;

        let metadata_value = |name: &str| {
            callback
                .callback_metadata
                .as_ref()
                .and_then(|m| m.items.iter().find(|item| item.name == name))
                .and_then(|item| item.value.as_ref())
        };
        // Metadata values arrive as either numbers or strings.
        let metadata_text = |name: &str| {
            metadata_value(name).map(|v| match v {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            })
        };

        let phone = metadata_text("PhoneNumber").and_then(|s| PhoneNumber::parse(&s).ok());
        let receipt = metadata_text("MpesaReceiptNumber");

        Ok(Self {
            correlation_id: CorrelationId::new(callback.checkout_request_id),
            result_code: callback.result_code,
            description: callback.result_desc,
            phone,
            receipt,
            raw,
        })
    }

    /// Returns true if the result code indicates a completed payment.
    pub fn is_success(&self) -> bool {
        self.result_code == 0
    }

    /// Converts into the payment's audit-log record.
    pub fn to_record(&self) -> GatewayRecord {
        GatewayRecord::Callback {
            result_code: self.result_code,
            description: self.description.clone(),
            raw: self.raw.clone(),
        }
    }
}
