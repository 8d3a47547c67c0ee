use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{OrderId, Version};
use domain::Order;
use tokio::sync::RwLock;

use crate::{OrderStore, Result, StoreError};

/// In-memory order store for tests and local development.
///
/// Provides the same versioning semantics as the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Clears all orders.
    pub async fn clear(&self) {
        self.orders.write().await.clear();
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: &mut Order) -> Result<()> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.id()) {
            return Err(StoreError::AlreadyExists(order.id()));
        }
        order.set_version(Version::first());
        orders.insert(order.id(), order.clone());
        Ok(())
    }

    async fn update(&self, order: &mut Order) -> Result<()> {
        let mut orders = self.orders.write().await;
        let stored = orders
            .get(&order.id())
            .ok_or(StoreError::NotFound(order.id()))?;

        if stored.version() != order.version() {
            return Err(StoreError::ConcurrencyConflict {
                order_id: order.id(),
                expected: order.version(),
                actual: stored.version(),
            });
        }

        order.set_version(order.version().next());
        orders.insert(order.id(), order.clone());
        Ok(())
    }

    async fn get(&self, order_id: OrderId) -> Result<Option<Order>> {
        Ok(self.orders.read().await.get(&order_id).cloned())
    }

    async fn list(&self) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut all: Vec<Order> = orders.values().cloned().collect();
        all.sort_by_key(|o| o.id());
        Ok(all)
    }

    async fn max_order_sequence(&self) -> Result<u64> {
        let orders = self.orders.read().await;
        Ok(orders.keys().map(|id| id.sequence()).max().unwrap_or(0))
    }
}
