//! M-Pesa STK push gateway client.
//!
//! The remote payment provider is modeled as an opaque service with two
//! operations behind the [`PaymentGateway`] trait: a credential exchange
//! ([`PaymentGateway::authorize`]) and a payment initiation
//! ([`PaymentGateway::initiate`]). Business-level rejections are data on
//! the returned [`StkInitiation`], not errors; the client never retries on
//! its own. [`HttpGateway`] talks to the real Daraja endpoints,
//! [`MockGateway`] scripts outcomes for tests.

pub mod client;
pub mod credentials;
pub mod error;
pub mod mock;
pub mod types;

pub use client::{AccessToken, HttpGateway, PaymentGateway};
pub use credentials::{Environment, GatewayConfig, derive_password, derive_timestamp};
pub use error::GatewayError;
pub use mock::MockGateway;
pub use types::{InitiateRequest, StkCallback, StkInitiation, StkPushRequest};
