//! Client-side payment status polling.

use std::time::Duration;

use domain::{PaymentId, PaymentStatus};
use store::TxStore;

use crate::error::PollError;

/// Polling bounds: a fixed interval and a maximum attempt count.
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            max_attempts: 15,
        }
    }
}

/// Repeatedly reads a payment's status until it is terminal.
///
/// Covers the case where the webhook callback is delayed or
/// undeliverable. Polling only reads payment state; exhausting the
/// attempt budget surfaces [`PollError::Timeout`], which is advisory —
/// distinct from a payment failure — and leaves the records to be
/// resolved by a late callback or operator reconciliation.
pub struct StatusPoller<S> {
    store: S,
    config: PollConfig,
}

impl<S: TxStore> StatusPoller<S> {
    /// Creates a poller with the given bounds.
    pub fn new(store: S, config: PollConfig) -> Self {
        Self { store, config }
    }

    /// Polls until the payment reaches a terminal status or the attempt
    /// budget runs out.
    #[tracing::instrument(skip(self))]
    pub async fn poll(&self, payment_id: PaymentId) -> Result<PaymentStatus, PollError> {
        for attempt in 1..=self.config.max_attempts {
            let status = self
                .store
                .read(|docs| docs.payment(&payment_id).map(|p| p.status))
                .await?
                .ok_or(PollError::UnknownPayment(payment_id))?;

            if status.is_terminal() {
                return Ok(status);
            }

            tracing::debug!(attempt, %status, "payment not yet terminal");
            if attempt < self.config.max_attempts {
                tokio::time::sleep(self.config.interval).await;
            }
        }
        Err(PollError::Timeout {
            attempts: self.config.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use domain::{CorrelationId, GatewayRecord, Money, OrderId, Payment, PhoneNumber};
    use store::{MemoryStore, StoreError};

    use super::*;

    fn pending_payment() -> Payment {
        let mut payment = Payment::initiated(
            OrderId::new(),
            Money::from_units(100),
            PhoneNumber::parse("254712345678").unwrap(),
        );
        payment
            .confirm(
                CorrelationId::new("ws_CO_0001"),
                GatewayRecord::Initiation {
                    response_code: "0".to_string(),
                    description: "ok".to_string(),
                    raw: serde_json::json!({}),
                },
            )
            .unwrap();
        payment
    }

    async fn store_with(payment: Payment) -> MemoryStore {
        let store = MemoryStore::new();
        store
            .transaction::<_, StoreError, _>(move |docs| {
                docs.put_payment(payment);
                Ok(())
            })
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_terminal_status_stops_polling_immediately() {
        let mut payment = pending_payment();
        payment
            .settle(
                PaymentStatus::Completed,
                GatewayRecord::Callback {
                    result_code: 0,
                    description: "ok".to_string(),
                    raw: serde_json::json!({}),
                },
            )
            .unwrap();
        let payment_id = payment.id;
        let store = store_with(payment).await;

        let poller = StatusPoller::new(store, PollConfig::default());
        let status = poller.poll(payment_id).await.unwrap();
        assert_eq!(status, PaymentStatus::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_attempts_report_timeout() {
        let payment = pending_payment();
        let payment_id = payment.id;
        let store = store_with(payment).await;

        let poller = StatusPoller::new(store.clone(), PollConfig::default());
        let err = poller.poll(payment_id).await.unwrap_err();
        assert!(matches!(err, PollError::Timeout { attempts: 15 }));

        // The records are left untouched for later reconciliation.
        let status = store
            .read(|docs| docs.payment(&payment_id).map(|p| p.status))
            .await
            .unwrap();
        assert_eq!(status, Some(PaymentStatus::Pending));
    }

    #[tokio::test(start_paused = true)]
    async fn test_observes_status_settled_mid_poll() {
        let payment = pending_payment();
        let payment_id = payment.id;
        let store = store_with(payment).await;

        let settler = {
            let store = store.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(10)).await;
                store
                    .transaction::<_, StoreError, _>(move |docs| {
                        docs.payment_mut(&payment_id)
                            .unwrap()
                            .settle(
                                PaymentStatus::Failed,
                                GatewayRecord::Callback {
                                    result_code: 1,
                                    description: "failed".to_string(),
                                    raw: serde_json::json!({}),
                                },
                            )
                            .unwrap();
                        Ok(())
                    })
                    .await
                    .unwrap();
            })
        };

        let poller = StatusPoller::new(store, PollConfig::default());
        let status = poller.poll(payment_id).await.unwrap();
        assert_eq!(status, PaymentStatus::Failed);
        settler.await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_payment() {
        let store = MemoryStore::new();
        let poller = StatusPoller::new(store, PollConfig::default());
        let err = poller.poll(PaymentId::new()).await.unwrap_err();
        assert!(matches!(err, PollError::UnknownPayment(_)));
    }
}
