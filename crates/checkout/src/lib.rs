//! Checkout orchestration and payment reconciliation.
//!
//! This crate is the consistency core: it keeps the order, payment, and
//! inventory records coherent across a fallible, partially-ordered
//! sequence of local transactions and remote gateway calls.
//!
//! The checkout runs as a two-phase local protocol:
//! 1. Reserve — one short transaction validates the cart, creates the
//!    order and an `Initiated` payment, and decrements stock.
//! 2. Finalize or release — after the gateway responds, a second short
//!    transaction either confirms the payment (`Pending`, correlation id
//!    set) or restores the reservation as if the checkout never happened.
//!
//! The asynchronous outcome is reconciled by [`CallbackReconciler`]
//! (idempotent under duplicate delivery), observed by [`StatusPoller`]
//! when the callback is delayed, and [`ReservationSweeper`] releases
//! reservations whose finalize phase never ran.

pub mod error;
pub mod orchestrator;
pub mod poller;
pub mod reconciler;
pub mod sweeper;

pub use error::{CallbackError, CheckoutError, PollError};
pub use orchestrator::{CartLine, CheckoutOrchestrator, CheckoutReceipt, CustomerDetails};
pub use poller::{PollConfig, StatusPoller};
pub use reconciler::{CallbackReconciler, ReconcileOutcome};
pub use sweeper::ReservationSweeper;
