//! Typed document collections.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use domain::{CorrelationId, Order, OrderId, Payment, PaymentId, PaymentStatus, Product, ProductId, UserId};

/// The document collections a transaction operates on.
///
/// This is the working set handed to a [`crate::TxStore`] transaction
/// closure: the product collection doubles as the inventory ledger, and the
/// order and payment collections are the record managers' backing state.
/// Mutations become visible to other transactions only on commit.
#[derive(Debug, Clone, Default)]
pub struct Documents {
    products: HashMap<ProductId, Product>,
    orders: HashMap<OrderId, Order>,
    payments: HashMap<PaymentId, Payment>,
}

impl Documents {
    /// Creates empty collections.
    pub fn new() -> Self {
        Self::default()
    }

    // -- Products / inventory ledger --

    /// Looks up a product by id.
    pub fn product(&self, id: &ProductId) -> Option<&Product> {
        self.products.get(id)
    }

    /// Looks up a product for mutation.
    pub fn product_mut(&mut self, id: &ProductId) -> Option<&mut Product> {
        self.products.get_mut(id)
    }

    /// Inserts or replaces a product.
    pub fn put_product(&mut self, product: Product) {
        self.products.insert(product.id.clone(), product);
    }

    /// Iterates over all products.
    pub fn products(&self) -> impl Iterator<Item = &Product> {
        self.products.values()
    }

    // -- Orders --

    /// Looks up an order by id.
    pub fn order(&self, id: &OrderId) -> Option<&Order> {
        self.orders.get(id)
    }

    /// Looks up an order for mutation.
    pub fn order_mut(&mut self, id: &OrderId) -> Option<&mut Order> {
        self.orders.get_mut(id)
    }

    /// Inserts or replaces an order.
    pub fn put_order(&mut self, order: Order) {
        self.orders.insert(order.id, order);
    }

    /// Removes an order, returning it if present.
    pub fn remove_order(&mut self, id: &OrderId) -> Option<Order> {
        self.orders.remove(id)
    }

    /// Iterates over all orders.
    pub fn orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.values()
    }

    /// Returns a user's orders, newest first.
    pub fn orders_for_user(&self, user_id: UserId) -> Vec<&Order> {
        let mut orders: Vec<&Order> = self
            .orders
            .values()
            .filter(|o| o.user_id == user_id)
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders
    }

    // -- Payments --

    /// Looks up a payment by id.
    pub fn payment(&self, id: &PaymentId) -> Option<&Payment> {
        self.payments.get(id)
    }

    /// Looks up a payment for mutation.
    pub fn payment_mut(&mut self, id: &PaymentId) -> Option<&mut Payment> {
        self.payments.get_mut(id)
    }

    /// Inserts or replaces a payment.
    pub fn put_payment(&mut self, payment: Payment) {
        self.payments.insert(payment.id, payment);
    }

    /// Removes a payment, returning it if present.
    pub fn remove_payment(&mut self, id: &PaymentId) -> Option<Payment> {
        self.payments.remove(id)
    }

    /// Iterates over all payments.
    pub fn payments(&self) -> impl Iterator<Item = &Payment> {
        self.payments.values()
    }

    /// Finds the payment holding the given gateway correlation id.
    pub fn payment_by_correlation(&self, correlation_id: &CorrelationId) -> Option<&Payment> {
        self.payments
            .values()
            .find(|p| p.correlation_id.as_ref() == Some(correlation_id))
    }

    /// Returns ids of `Initiated` payments created at or before `cutoff`.
    ///
    /// These are reservations whose gateway phase never completed; the
    /// reservation sweep releases them.
    pub fn stale_initiated_payments(&self, cutoff: DateTime<Utc>) -> Vec<PaymentId> {
        self.payments
            .values()
            .filter(|p| p.status == PaymentStatus::Initiated && p.created_at <= cutoff)
            .map(|p| p.id)
            .collect()
    }
}
