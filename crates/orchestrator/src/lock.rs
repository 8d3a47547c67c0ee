//! Per-order mutual exclusion.

use std::collections::HashMap;
use std::sync::Mutex as StdMutex;
use std::sync::Arc;

use common::OrderId;
use tokio::sync::Mutex;

/// Lazily populated table of per-order locks.
///
/// Two concurrent transitions on the same order serialize on its lock; orders
/// are independent of each other (shared product stock is serialized by the
/// stock ledger itself), so there is no global lock. External calls are made
/// outside the lock — it is only held to read state, decide, and commit.
#[derive(Default)]
pub struct OrderLocks {
    locks: StdMutex<HashMap<OrderId, Arc<Mutex<()>>>>,
}

impl OrderLocks {
    /// Creates an empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the lock for an order, creating it on first use. Repeated
    /// lookups return the same lock.
    pub fn for_order(&self, order_id: OrderId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap();
        locks
            .entry(order_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
