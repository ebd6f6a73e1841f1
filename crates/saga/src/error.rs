//! Saga error types.

use common::{OrderId, TransactionId};
use domain::{OrderError, TransactionError};
use store::StoreError;
use thiserror::Error;

/// Errors that can occur during saga operations.
#[derive(Debug, Error)]
pub enum SagaError {
    /// A buyer or farmer lookup came back empty.
    #[error("{role} not found: {user_id}")]
    PartyNotFound { role: &'static str, user_id: String },

    /// A product lookup came back empty.
    #[error("Product not found: {product_id}")]
    ProductNotFound { product_id: String },

    /// Stock reservation could not be confirmed.
    #[error("Insufficient stock for product {product_id}")]
    InsufficientStock { product_id: String },

    /// The order is not in the state the operation requires.
    #[error("Invalid order state: expected {expected}, actual {actual}")]
    InvalidState {
        expected: &'static str,
        actual: String,
    },

    /// The payment processor declined or failed the payment.
    #[error("Payment failed: {reason}")]
    PaymentFailed { reason: String },

    /// A collaborator timed out or returned a non-success response.
    #[error("{service} unavailable: {reason}")]
    DownstreamUnavailable {
        service: &'static str,
        reason: String,
    },

    /// Order not found.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// Transaction not found.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    /// Order state machine violation.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Transaction state machine violation.
    #[error("Transaction error: {0}")]
    Transaction(#[from] TransactionError),

    /// Store error, including optimistic concurrency conflicts.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl SagaError {
    /// Stable machine-readable code surfaced to callers.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::PartyNotFound { .. } => "PARTY_NOT_FOUND",
            Self::ProductNotFound { .. } => "PRODUCT_NOT_FOUND",
            Self::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            Self::InvalidState { .. } => "INVALID_STATE",
            Self::PaymentFailed { .. } => "PAYMENT_FAILED",
            Self::DownstreamUnavailable { .. } => "DOWNSTREAM_UNAVAILABLE",
            Self::OrderNotFound(_) => "ORDER_NOT_FOUND",
            Self::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            Self::Order(OrderError::InvalidTransition { .. }) => "INVALID_STATE",
            Self::Order(_) => "INVALID_ORDER",
            Self::Transaction(_) => "INVALID_STATE",
            Self::Store(StoreError::VersionConflict { .. }) => "CONFLICT",
            Self::Store(StoreError::NotFound { .. }) => "NOT_FOUND",
            Self::Store(_) => "STORE_ERROR",
        }
    }
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;
