//! Domain error types.

use thiserror::Error;

use crate::order::OrderStatus;
use crate::transaction::TransactionStatus;

/// Errors raised by the order aggregate.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The requested status transition is not legal from the current status.
    #[error("Invalid transition: cannot {action} an order in {current} status")]
    InvalidTransition {
        current: OrderStatus,
        action: &'static str,
    },

    /// An item quantity was zero or negative.
    #[error("Invalid quantity for product {product_id}: {quantity}")]
    InvalidQuantity { product_id: String, quantity: String },

    /// An item unit price was zero or negative.
    #[error("Invalid unit price for product {product_id}: {unit_price}")]
    InvalidPrice {
        product_id: String,
        unit_price: String,
    },

    /// The order has no items.
    #[error("Order must contain at least one item")]
    NoItems,
}

/// Errors raised by the transaction ledger entities.
#[derive(Debug, Error)]
pub enum TransactionError {
    /// The requested status transition is not legal from the current status.
    #[error("Invalid transition: cannot {action} a transaction in {current} status")]
    InvalidTransition {
        current: TransactionStatus,
        action: &'static str,
    },
}
