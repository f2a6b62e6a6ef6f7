//! Domain error types.

use thiserror::Error;

use crate::ids::{PaymentId, ProductId};

/// Errors that can occur when constructing or mutating domain records.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The phone number does not match the supported carrier format.
    #[error("invalid phone number: {0}")]
    InvalidPhoneNumber(String),

    /// Not enough stock to satisfy a reservation.
    #[error("insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// A status transition that the record's lifecycle does not permit.
    #[error("invalid {entity} status transition: {from} -> {to}")]
    InvalidTransition {
        entity: &'static str,
        from: &'static str,
        to: &'static str,
    },

    /// The raw callback payload has already been recorded for this payment.
    #[error("callback already recorded for payment {0}")]
    CallbackAlreadyRecorded(PaymentId),
}
