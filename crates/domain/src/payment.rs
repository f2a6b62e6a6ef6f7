//! The payment aggregate, its status machine, and the gateway audit log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::{CorrelationId, OrderId, PaymentId};
use crate::money::Money;
use crate::phone::PhoneNumber;

/// The single supported payment method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Mpesa,
}

impl PaymentMethod {
    /// Returns the method name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Mpesa => "mpesa",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The lifecycle state of a payment.
///
/// State transitions:
/// ```text
/// Initiated ──► Pending ──┬──► Completed
///     │                   └──► Failed
///     └──────────────────────► Failed   (reservation released)
/// ```
///
/// `Initiated` is the pre-gateway phase: the reservation exists locally but
/// the gateway has not yet accepted the initiation. At most one terminal
/// transition ever occurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Reservation made, gateway initiation not yet confirmed.
    #[default]
    Initiated,

    /// Gateway accepted the initiation, awaiting the asynchronous outcome.
    Pending,

    /// The payer completed the payment (terminal state).
    Completed,

    /// The payment failed or the reservation was released (terminal state).
    Failed,
}

impl PaymentStatus {
    /// Returns true if no further transition is permitted.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Completed | PaymentStatus::Failed)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Initiated => "initiated",
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recorded exchange with the payment gateway, kept for audit.
///
/// Modeled as a tagged variant so reconciliation logic can match on it
/// exhaustively instead of digging through an unconstrained blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GatewayRecord {
    /// The gateway's response to the payment-initiation request.
    Initiation {
        response_code: String,
        description: String,
        raw: serde_json::Value,
    },
    /// The asynchronous outcome notification, recorded at most once.
    Callback {
        result_code: i64,
        description: String,
        raw: serde_json::Value,
    },
}

/// A payment aggregate, tied 1:1 to an order.
///
/// A retried checkout creates a new order and a new payment; a payment
/// record is never reused across attempts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub method: PaymentMethod,
    /// Equals the order total at creation.
    pub amount: Money,
    /// Gateway-assigned reconciliation key; `None` only while `Initiated`.
    pub correlation_id: Option<CorrelationId>,
    pub phone: PhoneNumber,
    pub status: PaymentStatus,
    /// Audit log of gateway exchanges, in arrival order.
    pub gateway_log: Vec<GatewayRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    /// Creates a payment in the pre-gateway `Initiated` phase.
    pub fn initiated(order_id: OrderId, amount: Money, phone: PhoneNumber) -> Self {
        let now = Utc::now();
        Self {
            id: PaymentId::new(),
            order_id,
            method: PaymentMethod::Mpesa,
            amount,
            correlation_id: None,
            phone,
            status: PaymentStatus::Initiated,
            gateway_log: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Confirms the gateway accepted the initiation (`Initiated` → `Pending`).
    ///
    /// Sets the correlation id exactly once and appends the initiation
    /// response to the audit log.
    pub fn confirm(
        &mut self,
        correlation_id: CorrelationId,
        initiation: GatewayRecord,
    ) -> Result<(), DomainError> {
        if self.status != PaymentStatus::Initiated {
            return Err(self.bad_transition(PaymentStatus::Pending));
        }
        self.correlation_id = Some(correlation_id);
        self.gateway_log.push(initiation);
        self.status = PaymentStatus::Pending;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Settles the payment with its terminal outcome (`Pending` → terminal).
    ///
    /// Records the raw callback payload once; a payment that is already
    /// terminal rejects the transition (callers treat that as a duplicate).
    pub fn settle(
        &mut self,
        outcome: PaymentStatus,
        callback: GatewayRecord,
    ) -> Result<(), DomainError> {
        debug_assert!(outcome.is_terminal());
        if self.status != PaymentStatus::Pending {
            return Err(self.bad_transition(outcome));
        }
        if self
            .gateway_log
            .iter()
            .any(|r| matches!(r, GatewayRecord::Callback { .. }))
        {
            return Err(DomainError::CallbackAlreadyRecorded(self.id));
        }
        self.gateway_log.push(callback);
        self.status = outcome;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Expires a payment whose gateway phase never completed
    /// (`Initiated` → `Failed`), used by the reservation sweep.
    pub fn expire(&mut self) -> Result<(), DomainError> {
        if self.status != PaymentStatus::Initiated {
            return Err(self.bad_transition(PaymentStatus::Failed));
        }
        self.status = PaymentStatus::Failed;
        self.updated_at = Utc::now();
        Ok(())
    }

    fn bad_transition(&self, to: PaymentStatus) -> DomainError {
        DomainError::InvalidTransition {
            entity: "payment",
            from: self.status.as_str(),
            to: to.as_str(),
        }
    }
}
