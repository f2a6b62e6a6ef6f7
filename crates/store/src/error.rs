//! Store error types.

use thiserror::Error;

/// Errors that can occur when interacting with the document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached or the transaction could not commit.
    #[error("document store unavailable: {0}")]
    Unavailable(String),

    /// A document referenced inside a transaction was not found.
    ///
    /// Within a single transaction a document looked up by an id obtained
    /// in the same transaction must exist; this surfaces the violation
    /// instead of panicking.
    #[error("missing {kind} document: {id}")]
    MissingDocument { kind: &'static str, id: String },
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
