//! Stock ledger trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use domain::ProductId;
use thiserror::Error;
use tokio::sync::RwLock;

/// Reservation failure: the named product cannot cover the requested
/// quantity. Nothing was decremented.
#[derive(Debug, Error)]
pub enum StockError {
    #[error("product {product_id} is out of stock")]
    OutOfStock { product_id: ProductId },
}

/// Committed stock counts per product.
///
/// Mutations are always relative — reserve subtracts, release adds — never
/// absolute overwrites, so concurrent orders cannot lose updates. Operations
/// on the same product are serialized; a race for the last unit resolves in
/// favor of whichever reserve call is serialized first, and the loser fails
/// cleanly instead of driving stock negative.
#[async_trait]
pub trait StockLedger: Send + Sync {
    /// Reserves quantity for one product.
    async fn reserve(&self, product_id: &ProductId, quantity: u32) -> Result<(), StockError>;

    /// Reserves every line or none: if any product cannot cover its line,
    /// no decrement happens at all.
    async fn reserve_all(&self, lines: &[(ProductId, u32)]) -> Result<(), StockError>;

    /// Releases previously reserved quantity for one product.
    async fn release(&self, product_id: &ProductId, quantity: u32);

    /// Releases previously reserved quantities for every line.
    async fn release_all(&self, lines: &[(ProductId, u32)]);

    /// Live available count for a product (0 if unknown).
    async fn available(&self, product_id: &ProductId) -> i64;
}

/// In-memory stock ledger.
///
/// A single write lock serializes all mutations, which also makes
/// `reserve_all` check-then-decrement atomic across its lines.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStockLedger {
    counts: Arc<RwLock<HashMap<ProductId, i64>>>,
}

impl InMemoryStockLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the available count for a product.
    pub async fn set_available(&self, product_id: ProductId, available: i64) {
        self.counts.write().await.insert(product_id, available);
    }
}

#[async_trait]
impl StockLedger for InMemoryStockLedger {
    async fn reserve(&self, product_id: &ProductId, quantity: u32) -> Result<(), StockError> {
        let line = [(product_id.clone(), quantity)];
        self.reserve_all(&line).await
    }

    async fn reserve_all(&self, lines: &[(ProductId, u32)]) -> Result<(), StockError> {
        let mut counts = self.counts.write().await;

        for (product_id, quantity) in lines {
            let available = counts.get(product_id).copied().unwrap_or(0);
            if available < *quantity as i64 {
                return Err(StockError::OutOfStock {
                    product_id: product_id.clone(),
                });
            }
        }
        for (product_id, quantity) in lines {
            *counts.entry(product_id.clone()).or_insert(0) -= *quantity as i64;
        }
        Ok(())
    }

    async fn release(&self, product_id: &ProductId, quantity: u32) {
        let mut counts = self.counts.write().await;
        *counts.entry(product_id.clone()).or_insert(0) += quantity as i64;
    }

    async fn release_all(&self, lines: &[(ProductId, u32)]) {
        let mut counts = self.counts.write().await;
        for (product_id, quantity) in lines {
            *counts.entry(product_id.clone()).or_insert(0) += *quantity as i64;
        }
    }

    async fn available(&self, product_id: &ProductId) -> i64 {
        self.counts
            .read()
            .await
            .get(product_id)
            .copied()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reserve_and_release() {
        let ledger = InMemoryStockLedger::new();
        ledger.set_available(ProductId::new("P1"), 5).await;

        ledger.reserve(&ProductId::new("P1"), 3).await.unwrap();
        assert_eq!(ledger.available(&ProductId::new("P1")).await, 2);

        ledger.release(&ProductId::new("P1"), 3).await;
        assert_eq!(ledger.available(&ProductId::new("P1")).await, 5);
    }

    #[tokio::test]
    async fn reserve_beyond_available_fails_cleanly() {
        let ledger = InMemoryStockLedger::new();
        ledger.set_available(ProductId::new("P1"), 2).await;

        let result = ledger.reserve(&ProductId::new("P1"), 3).await;
        assert!(matches!(result, Err(StockError::OutOfStock { .. })));
        assert_eq!(ledger.available(&ProductId::new("P1")).await, 2);
    }

    #[tokio::test]
    async fn reserve_all_is_all_or_nothing() {
        let ledger = InMemoryStockLedger::new();
        ledger.set_available(ProductId::new("P1"), 10).await;
        ledger.set_available(ProductId::new("P2"), 1).await;

        let result = ledger
            .reserve_all(&[(ProductId::new("P1"), 2), (ProductId::new("P2"), 5)])
            .await;

        assert!(matches!(
            result,
            Err(StockError::OutOfStock { ref product_id }) if product_id.as_str() == "P2"
        ));
        // The P1 line must not have been decremented.
        assert_eq!(ledger.available(&ProductId::new("P1")).await, 10);
        assert_eq!(ledger.available(&ProductId::new("P2")).await, 1);
    }

    #[tokio::test]
    async fn unknown_product_has_zero_stock() {
        let ledger = InMemoryStockLedger::new();
        assert_eq!(ledger.available(&ProductId::new("ghost")).await, 0);
        let result = ledger.reserve(&ProductId::new("ghost"), 1).await;
        assert!(matches!(result, Err(StockError::OutOfStock { .. })));
    }

    #[tokio::test]
    async fn race_for_last_unit_has_one_winner() {
        let ledger = InMemoryStockLedger::new();
        ledger.set_available(ProductId::new("P1"), 1).await;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move {
                ledger.reserve(&ProductId::new("P1"), 1).await.is_ok()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
        assert_eq!(ledger.available(&ProductId::new("P1")).await, 0);
    }
}
