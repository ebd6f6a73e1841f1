//! In-memory store implementations for tests and local runs.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, TransactionId, UserId};
use domain::{Order, OrderStatus, Transaction};
use tokio::sync::RwLock;

use crate::store::{OrderStore, TransactionStore};
use crate::{Result, StoreError};

/// In-memory order store.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl InMemoryOrderStore {
    /// Creates a new empty order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: &Order) -> Result<()> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.id()) {
            return Err(StoreError::AlreadyExists {
                kind: "Order",
                id: order.id().to_string(),
            });
        }
        orders.insert(order.id(), order.clone());
        Ok(())
    }

    async fn get(&self, order_id: OrderId) -> Result<Option<Order>> {
        Ok(self.orders.read().await.get(&order_id).cloned())
    }

    async fn update(&self, order: &mut Order) -> Result<()> {
        let mut orders = self.orders.write().await;
        let stored = orders
            .get_mut(&order.id())
            .ok_or_else(|| StoreError::NotFound {
                kind: "Order",
                id: order.id().to_string(),
            })?;

        if stored.version() != order.version() {
            tracing::warn!(
                order_id = %order.id(),
                expected = order.version().as_u64(),
                actual = stored.version().as_u64(),
                "order update lost the version race"
            );
            return Err(StoreError::VersionConflict {
                expected: order.version(),
                actual: stored.version(),
            });
        }

        order.set_version(order.version().next());
        *stored = order.clone();
        tracing::debug!(order_id = %order.id(), version = order.version().as_u64(), "order updated");
        Ok(())
    }

    async fn find_stale(&self, status: OrderStatus, cutoff: DateTime<Utc>) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut stale: Vec<Order> = orders
            .values()
            .filter(|o| o.status() == status && o.created_at() < cutoff)
            .cloned()
            .collect();
        stale.sort_by_key(|o| o.created_at());
        Ok(stale)
    }

    async fn list_by_buyer(&self, buyer_id: &UserId) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut found: Vec<Order> = orders
            .values()
            .filter(|o| o.buyer_id() == buyer_id)
            .cloned()
            .collect();
        found.sort_by_key(|o| std::cmp::Reverse(o.created_at()));
        Ok(found)
    }

    async fn list_by_farmer(&self, farmer_id: &UserId) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut found: Vec<Order> = orders
            .values()
            .filter(|o| o.farmer_id() == farmer_id)
            .cloned()
            .collect();
        found.sort_by_key(|o| std::cmp::Reverse(o.created_at()));
        Ok(found)
    }
}

/// In-memory transaction store.
#[derive(Clone, Default)]
pub struct InMemoryTransactionStore {
    transactions: Arc<RwLock<HashMap<TransactionId, Transaction>>>,
}

impl InMemoryTransactionStore {
    /// Creates a new empty transaction store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored transactions.
    pub async fn transaction_count(&self) -> usize {
        self.transactions.read().await.len()
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn insert(&self, transaction: &Transaction) -> Result<()> {
        let mut transactions = self.transactions.write().await;
        if transactions.contains_key(&transaction.id()) {
            return Err(StoreError::AlreadyExists {
                kind: "Transaction",
                id: transaction.id().to_string(),
            });
        }
        transactions.insert(transaction.id(), transaction.clone());
        Ok(())
    }

    async fn get(&self, transaction_id: TransactionId) -> Result<Option<Transaction>> {
        Ok(self.transactions.read().await.get(&transaction_id).cloned())
    }

    async fn update(&self, transaction: &Transaction) -> Result<()> {
        let mut transactions = self.transactions.write().await;
        let stored = transactions
            .get_mut(&transaction.id())
            .ok_or_else(|| StoreError::NotFound {
                kind: "Transaction",
                id: transaction.id().to_string(),
            })?;
        *stored = transaction.clone();
        Ok(())
    }

    async fn list_for_order(&self, order_id: OrderId) -> Result<Vec<Transaction>> {
        let transactions = self.transactions.read().await;
        let mut found: Vec<Transaction> = transactions
            .values()
            .filter(|t| t.order_id() == order_id)
            .cloned()
            .collect();
        found.sort_by_key(|t| std::cmp::Reverse(t.created_at()));
        Ok(found)
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Transaction>> {
        let transactions = self.transactions.read().await;
        let mut found: Vec<Transaction> = transactions
            .values()
            .filter(|t| t.payer_id() == user_id || t.payee_id() == user_id)
            .cloned()
            .collect();
        found.sort_by_key(|t| std::cmp::Reverse(t.created_at()));
        Ok(found)
    }
}
