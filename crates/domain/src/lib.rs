//! Domain records and value objects for the checkout engine.
//!
//! This crate defines the three collaborating records the reconciliation
//! core keeps consistent — [`Order`], [`Payment`], and the per-product
//! stock counter on [`Product`] — together with the value objects they are
//! built from and the status machines that guard their transitions.

pub mod error;
pub mod ids;
pub mod money;
pub mod order;
pub mod payment;
pub mod phone;
pub mod product;

pub use error::DomainError;
pub use ids::{CorrelationId, OrderId, PaymentId, ProductId, UserId};
pub use money::Money;
pub use order::{CustomerContact, LineItem, Order, OrderPaymentStatus, OrderStatus};
pub use payment::{GatewayRecord, Payment, PaymentMethod, PaymentStatus};
pub use phone::PhoneNumber;
pub use product::Product;
