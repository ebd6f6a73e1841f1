//! Per-order lock registry.

use std::collections::HashMap;
use std::sync::Arc;

use common::OrderId;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Serializes concurrent operations on the same order.
///
/// Granularity is per-order: operations on different orders never
/// contend. Entries persist for the life of the registry; the set of
/// active orders is small and bounded by the working set.
#[derive(Clone, Default)]
pub struct OrderLocks {
    locks: Arc<Mutex<HashMap<OrderId, Arc<Mutex<()>>>>>,
}

impl OrderLocks {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the lock for an order, waiting if another operation on
    /// the same order is in flight.
    pub async fn acquire(&self, order_id: OrderId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            Arc::clone(locks.entry(order_id).or_default())
        };
        lock.lock_owned().await
    }
}
