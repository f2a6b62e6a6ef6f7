//! The order aggregate and its lifecycle state machines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::{OrderId, ProductId, UserId};
use crate::money::Money;
use crate::phone::PhoneNumber;

/// The lifecycle state of an order.
///
/// Transitions are monotone and terminal after the first payment outcome:
/// ```text
/// Pending ──┬──► Paid
///           └──► PaymentFailed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Awaiting the payment outcome.
    #[default]
    Pending,

    /// Payment completed (terminal state).
    Paid,

    /// Payment failed, reservation compensated (terminal state).
    PaymentFailed,
}

impl OrderStatus {
    /// Returns true if no further transition is permitted.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Paid | OrderStatus::PaymentFailed)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::PaymentFailed => "payment_failed",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The order's view of its payment outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderPaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

impl OrderPaymentStatus {
    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderPaymentStatus::Pending => "pending",
            OrderPaymentStatus::Completed => "completed",
            OrderPaymentStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for OrderPaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A validated line item with server-side price and name snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// The product this line reserves stock for.
    pub product_id: ProductId,
    /// Product name at checkout time.
    pub name: String,
    /// Server-side unit price at checkout time.
    pub unit_price: Money,
    /// Quantity ordered (>= 1).
    pub quantity: u32,
}

impl LineItem {
    /// Creates a new line item.
    pub fn new(
        product_id: impl Into<ProductId>,
        name: impl Into<String>,
        unit_price: Money,
        quantity: u32,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            name: name.into(),
            unit_price,
            quantity,
        }
    }

    /// Returns the line subtotal (unit price x quantity).
    pub fn subtotal(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// Customer contact snapshot captured at checkout time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerContact {
    pub name: String,
    pub email: String,
    pub phone: PhoneNumber,
}

/// An order aggregate.
///
/// Created by the checkout orchestrator and mutated only by the callback
/// reconciler (or the reservation sweep) thereafter. The total is computed
/// from the validated line items at construction and never revised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub items: Vec<LineItem>,
    pub total: Money,
    pub status: OrderStatus,
    pub payment_status: OrderPaymentStatus,
    pub customer: CustomerContact,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub payment_completed_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Creates a pending order from validated line items.
    ///
    /// The total is computed here, from the items' server-side price
    /// snapshots, so `total == Σ(unit_price × quantity)` holds by
    /// construction.
    pub fn new(user_id: UserId, items: Vec<LineItem>, customer: CustomerContact) -> Self {
        let total = items
            .iter()
            .fold(Money::zero(), |acc, item| acc + item.subtotal());
        let now = Utc::now();
        Self {
            id: OrderId::new(),
            user_id,
            items,
            total,
            status: OrderStatus::Pending,
            payment_status: OrderPaymentStatus::Pending,
            customer,
            created_at: now,
            updated_at: now,
            payment_completed_at: None,
        }
    }

    /// Marks the order paid after a successful payment outcome.
    pub fn mark_paid(&mut self) -> Result<(), DomainError> {
        self.transition_to(OrderStatus::Paid)?;
        self.payment_status = OrderPaymentStatus::Completed;
        let now = Utc::now();
        self.payment_completed_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Marks the order failed after an unsuccessful payment outcome.
    pub fn mark_payment_failed(&mut self) -> Result<(), DomainError> {
        self.transition_to(OrderStatus::PaymentFailed)?;
        self.payment_status = OrderPaymentStatus::Failed;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Replaces the customer phone snapshot (from callback metadata).
    pub fn refresh_phone(&mut self, phone: PhoneNumber) {
        self.customer.phone = phone;
    }

    fn transition_to(&mut self, to: OrderStatus) -> Result<(), DomainError> {
        if self.status.is_terminal() {
            return Err(DomainError::InvalidTransition {
                entity: "order",
                from: self.status.as_str(),
                to: to.as_str(),
            });
        }
        self.status = to;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact() -> CustomerContact {
        CustomerContact {
            name: "Jane Doe".to_string(),
            email: "jane@example.com".to_string(),
            phone: PhoneNumber::parse("254712345678").unwrap(),
        }
    }

    fn two_line_order() -> Order {
        Order::new(
            UserId::new(),
            vec![
                LineItem::new("SKU-001", "Hockey Stick", Money::from_units(12_000), 1),
                LineItem::new("SKU-002", "Puck", Money::from_units(500), 3),
            ],
            contact(),
        )
    }

    #[test]
    fn test_total_is_sum_of_line_subtotals() {
        let order = two_line_order();
        assert_eq!(order.total, Money::from_units(12_000 + 3 * 500));
    }

    #[test]
    fn test_mark_paid_sets_completion_time() {
        let mut order = two_line_order();
        order.mark_paid().unwrap();
        assert_eq!(order.status, OrderStatus::Paid);
        assert_eq!(order.payment_status, OrderPaymentStatus::Completed);
        assert!(order.payment_completed_at.is_some());
    }

    #[test]
    fn test_terminal_status_rejects_further_transitions() {
        let mut order = two_line_order();
        order.mark_payment_failed().unwrap();
        assert!(order.mark_paid().is_err());
        assert_eq!(order.status, OrderStatus::PaymentFailed);
        assert!(order.payment_completed_at.is_none());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&OrderStatus::PaymentFailed).unwrap();
        assert_eq!(json, "\"payment_failed\"");
    }
}
