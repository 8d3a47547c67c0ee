use async_trait::async_trait;
use common::OrderId;
use domain::Order;

use crate::Result;

/// Backend-agnostic order persistence.
///
/// Writes use optimistic concurrency: `insert` requires the order to be new,
/// `update` requires the caller to hold the version it loaded. The
/// orchestrator serializes writers per order, so a conflict here indicates a
/// bug rather than an expected race — but the store still refuses to lose an
/// update.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists a new order. Sets the order's version to the first persisted
    /// version on success.
    async fn insert(&self, order: &mut Order) -> Result<()>;

    /// Persists changes to an existing order.
    ///
    /// The order's current version must match the stored version; on success
    /// the order's version is bumped to the new stored version.
    async fn update(&self, order: &mut Order) -> Result<()>;

    /// Loads an order by ID. Returns `None` if it does not exist.
    async fn get(&self, order_id: OrderId) -> Result<Option<Order>>;

    /// Returns all orders, oldest first.
    async fn list(&self) -> Result<Vec<Order>>;

    /// Returns the highest order sequence number ever persisted (0 if none).
    ///
    /// Used to seed the order-number sequence at startup.
    async fn max_order_sequence(&self) -> Result<u64>;
}
