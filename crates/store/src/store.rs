//! Core trait for transactional document store implementations.

use async_trait::async_trait;

use crate::documents::Documents;
use crate::error::StoreError;

/// A handle to a document store with multi-document ACID transactions.
///
/// Handles are explicitly constructed and passed to each component; there
/// is no process-global connection state. All implementations must be
/// thread-safe (Send + Sync) and cheap to clone.
#[async_trait]
pub trait TxStore: Send + Sync {
    /// Runs a read-only closure against a committed snapshot.
    async fn read<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Documents) -> T + Send,
        T: Send;

    /// Runs a closure as one atomic transaction.
    ///
    /// The closure receives a private working copy of the collections.
    /// Returning `Ok` commits every mutation at once; returning `Err`
    /// discards them all — no partial state is ever observable by other
    /// transactions. Concurrent transactions are serialized by the store,
    /// so conditional checks inside the closure never act on stale reads.
    async fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Documents) -> Result<T, E> + Send,
        T: Send,
        E: From<StoreError> + Send;
}
