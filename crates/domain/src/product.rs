//! Product records and the per-product stock counter.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::ProductId;
use crate::money::Money;

/// A catalog product with its available stock counter.
///
/// The stock counter is the only hot shared-mutation resource in the
/// system: checkouts decrement it optimistically and the reconciler
/// restores it when a payment ultimately fails. It never goes negative —
/// [`Product::reserve`] is conditional on sufficient stock and is only
/// called inside a store transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    /// Server-side unit price; client-submitted prices are never trusted.
    pub price: Money,
    pub stock: u32,
}

impl Product {
    /// Creates a new product.
    pub fn new(
        id: impl Into<ProductId>,
        name: impl Into<String>,
        price: Money,
        stock: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            price,
            stock,
        }
    }

    /// Conditionally decrements stock for a reservation.
    ///
    /// Fails with [`DomainError::InsufficientStock`] without mutating when
    /// fewer than `quantity` units are available.
    pub fn reserve(&mut self, quantity: u32) -> Result<(), DomainError> {
        if self.stock < quantity {
            return Err(DomainError::InsufficientStock {
                product_id: self.id.clone(),
                requested: quantity,
                available: self.stock,
            });
        }
        self.stock -= quantity;
        Ok(())
    }

    /// Restores previously reserved stock (compensation).
    pub fn restock(&mut self, quantity: u32) {
        self.stock += quantity;
    }
}
