//! Error taxonomy for the checkout and reconciliation workflows.

use domain::{CorrelationId, DomainError, PaymentId, ProductId};
use gateway::GatewayError;
use store::StoreError;
use thiserror::Error;

/// Errors surfaced by the checkout orchestrator.
///
/// Every variant means the checkout as a whole did not go through;
/// the enclosing transaction was aborted and nothing from this attempt
/// remains observable.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The request failed validation before any mutation.
    #[error("invalid checkout request: {0}")]
    Validation(String),

    /// A cart line referenced a product that does not exist.
    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    /// A cart line asked for more units than are available.
    #[error("insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// The gateway refused the credential exchange.
    #[error("gateway credential exchange failed: {0}")]
    AuthFailed(GatewayError),

    /// The gateway could not be reached or answered unintelligibly.
    #[error("payment gateway unreachable: {0}")]
    GatewayUnreachable(GatewayError),

    /// The gateway rejected the initiation at the business level.
    #[error("payment initiation rejected: {description}")]
    GatewayRejected { description: String },

    /// A record refused an operation its lifecycle does not permit.
    #[error(transparent)]
    Domain(DomainError),

    /// The document store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<DomainError> for CheckoutError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::InsufficientStock {
                product_id,
                requested,
                available,
            } => CheckoutError::InsufficientStock {
                product_id,
                requested,
                available,
            },
            other => CheckoutError::Domain(other),
        }
    }
}

/// Errors surfaced by the callback reconciler.
///
/// Both variants reject the callback without touching the store; a
/// duplicate delivery is not an error (see
/// [`crate::ReconcileOutcome::AlreadySettled`]).
#[derive(Debug, Error)]
pub enum CallbackError {
    /// The payload does not match the documented callback envelope.
    #[error("malformed callback payload: {0}")]
    Malformed(String),

    /// No payment holds the callback's correlation id.
    #[error("no payment found for correlation id {0}")]
    UnknownPayment(CorrelationId),

    /// A record refused an operation its lifecycle does not permit.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The document store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors surfaced by the status poller.
#[derive(Debug, Error)]
pub enum PollError {
    /// No terminal status was observed within the attempt budget.
    ///
    /// Advisory: the underlying records are left untouched for the
    /// callback or operator reconciliation to resolve later.
    #[error("payment status polling timed out after {attempts} attempts")]
    Timeout { attempts: u32 },

    /// The polled payment does not exist.
    #[error("no payment found with id {0}")]
    UnknownPayment(PaymentId),

    /// The document store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}
