//! In-memory document store implementation.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::documents::Documents;
use crate::error::StoreError;
use crate::store::TxStore;

/// In-memory document store.
///
/// Transactions run on a working copy under the write lock and replace the
/// committed state only when the closure succeeds, which gives the same
/// commit-or-discard and serialized-isolation semantics the core expects
/// from a production store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Documents>>,
}

impl MemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TxStore for MemoryStore {
    async fn read<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Documents) -> T + Send,
        T: Send,
    {
        let docs = self.inner.read().await;
        Ok(f(&docs))
    }

    async fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Documents) -> Result<T, E> + Send,
        T: Send,
        E: From<StoreError> + Send,
    {
        let mut committed = self.inner.write().await;
        let mut working = committed.clone();
        let value = f(&mut working)?;
        *committed = working;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use domain::{Money, Product, ProductId};

    use super::*;

    async fn seeded_store() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .transaction::<_, StoreError, _>(|docs| {
                docs.put_product(Product::new(
                    "SKU-001",
                    "Hockey Stick",
                    Money::from_units(12_000),
                    5,
                ));
                Ok(())
            })
            .await
            .unwrap();
        store
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_commit_makes_mutations_visible() {
        let store = seeded_store().await;
        let id = ProductId::new("SKU-001");

        store
            .transaction::<_, StoreError, _>(|docs| {
                docs.product_mut(&id)
                    .ok_or(StoreError::MissingDocument {
                        kind: "product",
                        id: id.to_string(),
                    })?
                    .reserve(2)
                    .map_err(|e| StoreError::Unavailable(e.to_string()))?;
                Ok(())
            })
            .await
            .unwrap();

        let stock = store
            .read(|docs| docs.product(&id).map(|p| p.stock))
            .await
            .unwrap();
        assert_eq!(stock, Some(3));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_error_rolls_back_every_mutation() {
        let store = seeded_store().await;
        let id = ProductId::new("SKU-001");

        let result = store
            .transaction::<(), StoreError, _>(|docs| {
                docs.product_mut(&id).unwrap().reserve(2).unwrap();
                Err(StoreError::Unavailable("induced".to_string()))
            })
            .await;
        assert!(result.is_err());

        let stock = store
            .read(|docs| docs.product(&id).map(|p| p.stock))
            .await
            .unwrap();
        assert_eq!(stock, Some(5), "aborted transaction must not leak writes");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_conditional_decrements_serialize() {
        let store = seeded_store().await;
        let id = ProductId::new("SKU-001");

        let attempt = |store: MemoryStore, id: ProductId| async move {
            store
                .transaction::<_, StoreError, _>(move |docs| {
                    let product = docs.product_mut(&id).unwrap();
                    product
                        .reserve(5)
                        .map_err(|e| StoreError::Unavailable(e.to_string()))
                })
                .await
        };

        let (a, b) = tokio::join!(
            attempt(store.clone(), id.clone()),
            attempt(store.clone(), id.clone())
        );
        assert_eq!(
            a.is_ok() as u8 + b.is_ok() as u8,
            1,
            "exactly one of two competing reservations may win"
        );

        let stock = store
            .read(|docs| docs.product(&id).map(|p| p.stock))
            .await
            .unwrap();
        assert_eq!(stock, Some(0));
    }
}
