//! Reconciliation of asynchronous payment outcomes.

use domain::{OrderId, PaymentId, PaymentStatus};
use gateway::StkCallback;
use store::{StoreError, TxStore};

use crate::error::CallbackError;

/// What a reconciliation run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The terminal outcome was applied to the payment, order, and (on
    /// failure) the inventory ledger.
    Applied {
        payment_id: PaymentId,
        order_id: OrderId,
        status: PaymentStatus,
    },
    /// The payment was already terminal; the callback was a no-op.
    AlreadySettled {
        payment_id: PaymentId,
        status: PaymentStatus,
    },
}

/// Applies gateway outcome notifications to the local records.
///
/// This is the single place where the at-most-once compensation invariant
/// must hold: the whole update runs in one transaction, and the
/// terminal-status check inside that transaction — not an external lock —
/// serializes duplicate or racing deliveries.
pub struct CallbackReconciler<S> {
    store: S,
}

impl<S: TxStore> CallbackReconciler<S> {
    /// Creates a new reconciler over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Reconciles one inbound notification payload.
    ///
    /// The payload is untrusted: shape failures reject with
    /// [`CallbackError::Malformed`] and an unknown correlation id with
    /// [`CallbackError::UnknownPayment`], in both cases without touching
    /// the store. Duplicate deliveries return
    /// [`ReconcileOutcome::AlreadySettled`].
    #[tracing::instrument(skip(self, payload))]
    pub async fn reconcile(
        &self,
        payload: serde_json::Value,
    ) -> Result<ReconcileOutcome, CallbackError> {
        metrics::counter!("payment_callbacks_total").increment(1);

        let callback = StkCallback::from_payload(payload)
            .map_err(|e| CallbackError::Malformed(e.to_string()))?;
        let correlation_id = callback.correlation_id.clone();

        let outcome = self
            .store
            .transaction(move |docs| -> Result<ReconcileOutcome, CallbackError> {
                let (payment_id, order_id, current) = {
                    let payment = docs
                        .payment_by_correlation(&callback.correlation_id)
                        .ok_or_else(|| {
                            CallbackError::UnknownPayment(callback.correlation_id.clone())
                        })?;
                    (payment.id, payment.order_id, payment.status)
                };

                if current.is_terminal() {
                    return Ok(ReconcileOutcome::AlreadySettled {
                        payment_id,
                        status: current,
                    });
                }

                let status = if callback.is_success() {
                    PaymentStatus::Completed
                } else {
                    PaymentStatus::Failed
                };

                docs.payment_mut(&payment_id)
                    .ok_or(StoreError::MissingDocument {
                        kind: "payment",
                        id: payment_id.to_string(),
                    })?
                    .settle(status, callback.to_record())?;

                let compensation = {
                    let order = docs.order_mut(&order_id).ok_or(StoreError::MissingDocument {
                        kind: "order",
                        id: order_id.to_string(),
                    })?;
                    if callback.is_success() {
                        order.mark_paid()?;
                        if let Some(phone) = callback.phone.clone() {
                            order.refresh_phone(phone);
                        }
                        None
                    } else {
                        order.mark_payment_failed()?;
                        Some(order.items.clone())
                    }
                };

                // Restore the reservation, exactly once: the terminal-status
                // check above rejects any second attempt.
                if let Some(items) = compensation {
                    for item in &items {
                        if let Some(product) = docs.product_mut(&item.product_id) {
                            product.restock(item.quantity);
                        }
                    }
                }

                Ok(ReconcileOutcome::Applied {
                    payment_id,
                    order_id,
                    status,
                })
            })
            .await?;

        match outcome {
            ReconcileOutcome::Applied {
                payment_id, status, ..
            } => {
                tracing::info!(%payment_id, %correlation_id, %status, "payment outcome applied");
            }
            ReconcileOutcome::AlreadySettled { payment_id, status } => {
                metrics::counter!("callback_duplicates_total").increment(1);
                tracing::info!(
                    %payment_id,
                    %correlation_id,
                    %status,
                    "payment already terminal, callback ignored"
                );
            }
        }
        Ok(outcome)
    }
}
