//! Background release of abandoned reservations.

use chrono::Utc;
use store::{StoreError, TxStore};

use crate::error::CheckoutError;

/// Releases reservations whose finalize phase never completed.
///
/// A crash between the reserve and finalize transactions leaves a payment
/// in `Initiated` with stock decremented and no correlation id — no
/// callback can ever resolve it. The sweep expires such payments once
/// they outlive `max_age`, restoring the reserved stock and marking the
/// order failed. Unlike the synchronous release, the records are kept for
/// audit. Payments that reached `Pending` are never touched; their
/// outcome belongs to the callback path.
pub struct ReservationSweeper<S> {
    store: S,
    max_age: chrono::Duration,
}

impl<S: TxStore> ReservationSweeper<S> {
    /// Creates a sweeper that releases `Initiated` payments older than
    /// `max_age`.
    pub fn new(store: S, max_age: std::time::Duration) -> Self {
        Self {
            store,
            max_age: chrono::Duration::from_std(max_age).unwrap_or(chrono::Duration::MAX),
        }
    }

    /// Runs one sweep, returning how many reservations were released.
    #[tracing::instrument(skip(self))]
    pub async fn sweep_once(&self) -> Result<usize, CheckoutError> {
        let cutoff = Utc::now() - self.max_age;

        let released = self
            .store
            .transaction(move |docs| {
                let stale = docs.stale_initiated_payments(cutoff);
                for payment_id in &stale {
                    let order_id = docs
                        .payment(payment_id)
                        .map(|p| p.order_id)
                        .ok_or(StoreError::MissingDocument {
                            kind: "payment",
                            id: payment_id.to_string(),
                        })?;

                    docs.payment_mut(payment_id)
                        .ok_or(StoreError::MissingDocument {
                            kind: "payment",
                            id: payment_id.to_string(),
                        })?
                        .expire()?;

                    let items = {
                        let order =
                            docs.order_mut(&order_id)
                                .ok_or(StoreError::MissingDocument {
                                    kind: "order",
                                    id: order_id.to_string(),
                                })?;
                        order.mark_payment_failed()?;
                        order.items.clone()
                    };
                    for item in &items {
                        if let Some(product) = docs.product_mut(&item.product_id) {
                            product.restock(item.quantity);
                        }
                    }
                }
                Ok::<_, CheckoutError>(stale.len())
            })
            .await?;

        if released > 0 {
            metrics::counter!("reservations_released_total").increment(released as u64);
            tracing::warn!(released, "released expired reservations");
        }
        Ok(released)
    }

    /// Sweeps forever at the given interval. Intended to be spawned as a
    /// background task for the lifetime of the process.
    pub async fn run(self, every: std::time::Duration) {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(error) = self.sweep_once().await {
                tracing::error!(%error, "reservation sweep failed");
            }
        }
    }
}
