//! Store traits for orders and transactions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, TransactionId, UserId};
use domain::{Order, OrderStatus, Transaction};

use crate::Result;

/// Persistence for the order aggregate (order + items as one record).
///
/// Implementations must be thread-safe and must apply each `insert` and
/// `update` atomically for a single aggregate.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Inserts a new order. Fails with `AlreadyExists` if the ID is taken.
    async fn insert(&self, order: &Order) -> Result<()>;

    /// Loads an order by ID.
    async fn get(&self, order_id: OrderId) -> Result<Option<Order>>;

    /// Updates an order with an optimistic version check.
    ///
    /// Fails with `VersionConflict` if the stored record is not at
    /// `order.version()`; on success the order's version is bumped both
    /// in the store and on the passed-in record.
    async fn update(&self, order: &mut Order) -> Result<()>;

    /// Returns all orders in the given status created before `cutoff`.
    async fn find_stale(&self, status: OrderStatus, cutoff: DateTime<Utc>) -> Result<Vec<Order>>;

    /// Returns a buyer's orders, newest first.
    async fn list_by_buyer(&self, buyer_id: &UserId) -> Result<Vec<Order>>;

    /// Returns a farmer's orders, newest first.
    async fn list_by_farmer(&self, farmer_id: &UserId) -> Result<Vec<Order>>;
}

/// Persistence for the transaction ledger.
///
/// A transaction record owns its payment attempts; saving the record
/// persists the append-only attempt list with it.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Inserts a new transaction. Fails with `AlreadyExists` if the ID is taken.
    async fn insert(&self, transaction: &Transaction) -> Result<()>;

    /// Loads a transaction by ID.
    async fn get(&self, transaction_id: TransactionId) -> Result<Option<Transaction>>;

    /// Overwrites a transaction record. Fails with `NotFound` if missing.
    async fn update(&self, transaction: &Transaction) -> Result<()>;

    /// Returns all transactions referencing an order, newest first.
    async fn list_for_order(&self, order_id: OrderId) -> Result<Vec<Transaction>>;

    /// Returns all transactions where the user is payer or payee, newest first.
    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Transaction>>;
}
