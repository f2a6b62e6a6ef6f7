//! The checkout workflow.

use domain::{
    CorrelationId, CustomerContact, LineItem, Money, Order, OrderId, Payment, PaymentId,
    PaymentStatus, PhoneNumber, ProductId, UserId,
};
use gateway::{GatewayError, InitiateRequest, PaymentGateway, StkInitiation};
use store::{StoreError, TxStore};

use crate::error::CheckoutError;

/// One cart line as submitted by the client.
///
/// Deliberately carries no price: totals are computed from server-side
/// prices only.
#[derive(Debug, Clone)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Customer contact fields submitted with the checkout.
#[derive(Debug, Clone)]
pub struct CustomerDetails {
    pub name: String,
    pub email: String,
    pub phone_number: String,
}

/// What a successful checkout returns to the caller.
#[derive(Debug, Clone)]
pub struct CheckoutReceipt {
    pub order_id: OrderId,
    pub payment_id: PaymentId,
    pub correlation_id: CorrelationId,
    /// Human-readable instruction for the payer.
    pub message: String,
}

/// The committed phase-1 state a checkout attempt carries between
/// transactions.
#[derive(Debug, Clone, Copy)]
struct Reservation {
    order_id: OrderId,
    payment_id: PaymentId,
    total: Money,
}

/// Orchestrates the checkout workflow.
///
/// Validates the cart, reserves stock and creates the order + payment in
/// one transaction, runs the gateway exchange with no transaction held,
/// then finalizes or releases the reservation in a second transaction.
/// Checkout attempts may run concurrently; the store's transaction
/// isolation enforces the stock invariant.
pub struct CheckoutOrchestrator<S, G> {
    store: S,
    gateway: G,
}

impl<S, G> CheckoutOrchestrator<S, G>
where
    S: TxStore,
    G: PaymentGateway,
{
    /// Creates a new orchestrator over the given store and gateway.
    pub fn new(store: S, gateway: G) -> Self {
        Self { store, gateway }
    }

    /// Runs one checkout attempt end to end.
    ///
    /// Resubmitting after a failure is the caller's responsibility; every
    /// attempt creates a fresh order and payment.
    #[tracing::instrument(skip(self, cart, customer), fields(user_id = %user_id))]
    pub async fn checkout(
        &self,
        user_id: UserId,
        cart: Vec<CartLine>,
        customer: CustomerDetails,
    ) -> Result<CheckoutReceipt, CheckoutError> {
        metrics::counter!("checkout_attempts_total").increment(1);
        let started = std::time::Instant::now();

        let result = self.run(user_id, cart, customer).await;

        if result.is_err() {
            metrics::counter!("checkout_failures_total").increment(1);
        }
        metrics::histogram!("checkout_duration_seconds").record(started.elapsed().as_secs_f64());
        result
    }

    async fn run(
        &self,
        user_id: UserId,
        cart: Vec<CartLine>,
        customer: CustomerDetails,
    ) -> Result<CheckoutReceipt, CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::Validation("cart is empty".to_string()));
        }
        if let Some(line) = cart.iter().find(|line| line.quantity == 0) {
            return Err(CheckoutError::Validation(format!(
                "quantity for product {} must be at least 1",
                line.product_id
            )));
        }
        let phone = PhoneNumber::parse(&customer.phone_number)
            .map_err(|e| CheckoutError::Validation(e.to_string()))?;

        // Phase 1: reserve stock and create the order + payment.
        let reservation = self.reserve(user_id, &cart, &customer, &phone).await?;
        tracing::info!(
            order_id = %reservation.order_id,
            payment_id = %reservation.payment_id,
            total = %reservation.total,
            "reservation committed"
        );

        // Gateway exchange, with no transaction held.
        match self.initiate_payment(&reservation, phone).await {
            Ok(initiation) => match initiation.accepted() {
                Some(correlation_id) => {
                    let correlation_id = correlation_id.clone();
                    self.finalize(&reservation, correlation_id.clone(), &initiation)
                        .await?;
                    tracing::info!(
                        order_id = %reservation.order_id,
                        %correlation_id,
                        "payment initiation confirmed"
                    );
                    Ok(CheckoutReceipt {
                        order_id: reservation.order_id,
                        payment_id: reservation.payment_id,
                        correlation_id,
                        message: "Payment initiated. Check your phone to complete the M-Pesa payment."
                            .to_string(),
                    })
                }
                None => {
                    self.release(&reservation).await?;
                    Err(CheckoutError::GatewayRejected {
                        description: initiation.description,
                    })
                }
            },
            Err(error) => {
                self.release(&reservation).await?;
                Err(match error {
                    GatewayError::AuthFailed(_) => CheckoutError::AuthFailed(error),
                    _ => CheckoutError::GatewayUnreachable(error),
                })
            }
        }
    }

    /// Phase 1: all-or-nothing validation and reservation.
    async fn reserve(
        &self,
        user_id: UserId,
        cart: &[CartLine],
        customer: &CustomerDetails,
        phone: &PhoneNumber,
    ) -> Result<Reservation, CheckoutError> {
        let cart = cart.to_vec();
        let customer = customer.clone();
        let phone = phone.clone();

        self.store
            .transaction(move |docs| {
                // Re-read every product inside the transaction; totals come
                // from the authoritative price, never the client.
                let mut items = Vec::with_capacity(cart.len());
                for line in &cart {
                    let product = docs
                        .product(&line.product_id)
                        .ok_or_else(|| CheckoutError::ProductNotFound(line.product_id.clone()))?;
                    items.push(LineItem::new(
                        product.id.clone(),
                        product.name.clone(),
                        product.price,
                        line.quantity,
                    ));
                }

                let order = Order::new(
                    user_id,
                    items,
                    CustomerContact {
                        name: customer.name,
                        email: customer.email,
                        phone: phone.clone(),
                    },
                );
                let payment = Payment::initiated(order.id, order.total, phone);

                for line in &cart {
                    docs.product_mut(&line.product_id)
                        .ok_or(StoreError::MissingDocument {
                            kind: "product",
                            id: line.product_id.to_string(),
                        })?
                        .reserve(line.quantity)?;
                }

                let reservation = Reservation {
                    order_id: order.id,
                    payment_id: payment.id,
                    total: order.total,
                };
                docs.put_order(order);
                docs.put_payment(payment);
                Ok(reservation)
            })
            .await
    }

    async fn initiate_payment(
        &self,
        reservation: &Reservation,
        phone: PhoneNumber,
    ) -> Result<StkInitiation, GatewayError> {
        let token = self.gateway.authorize().await?;
        let request = InitiateRequest {
            amount: reservation.total,
            phone,
            account_reference: format!("ORDER_{}", reservation.order_id),
            description: "Payment for order".to_string(),
        };
        self.gateway.initiate(&token, request).await
    }

    /// Phase 2, success arm: set the correlation id and move the payment
    /// to `Pending`.
    async fn finalize(
        &self,
        reservation: &Reservation,
        correlation_id: CorrelationId,
        initiation: &StkInitiation,
    ) -> Result<(), CheckoutError> {
        let payment_id = reservation.payment_id;
        let record = initiation.to_record();
        self.store
            .transaction(move |docs| {
                docs.payment_mut(&payment_id)
                    .ok_or(StoreError::MissingDocument {
                        kind: "payment",
                        id: payment_id.to_string(),
                    })?
                    .confirm(correlation_id, record)?;
                Ok(())
            })
            .await
    }

    /// Phase 2, failure arm: undo the reservation as if the checkout
    /// never happened.
    ///
    /// Guarded by the `Initiated` status so a release can apply at most
    /// once, even if it races the reservation sweep.
    #[tracing::instrument(skip(self), fields(order_id = %reservation.order_id))]
    async fn release(&self, reservation: &Reservation) -> Result<(), CheckoutError> {
        let order_id = reservation.order_id;
        let payment_id = reservation.payment_id;

        let released = self
            .store
            .transaction(move |docs| {
                let still_initiated = docs
                    .payment(&payment_id)
                    .is_some_and(|p| p.status == PaymentStatus::Initiated);
                if !still_initiated {
                    return Ok::<_, CheckoutError>(false);
                }

                docs.remove_payment(&payment_id);
                if let Some(order) = docs.remove_order(&order_id) {
                    for item in &order.items {
                        if let Some(product) = docs.product_mut(&item.product_id) {
                            product.restock(item.quantity);
                        }
                    }
                }
                Ok(true)
            })
            .await?;

        if released {
            metrics::counter!("reservations_released_total").increment(1);
            tracing::warn!("reservation released after gateway failure");
        }
        Ok(())
    }
}
