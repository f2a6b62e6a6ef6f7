//! Transactional document store seam for the checkout engine.
//!
//! The storage engine itself is an external collaborator; this crate
//! defines the interface the core consumes — typed document collections
//! ([`Documents`]) mutated inside multi-document ACID transactions
//! ([`TxStore`]) — plus an in-memory implementation ([`MemoryStore`]) with
//! the same atomicity and isolation guarantees.

pub mod documents;
pub mod error;
pub mod memory;
pub mod store;

pub use documents::Documents;
pub use error::StoreError;
pub use memory::MemoryStore;
pub use store::TxStore;
