//! Domain layer for the terra-orders service.
//!
//! This crate provides the passive entity graphs and state machines:
//! - Order aggregate with its items, derived monetary fields and status
//!   state machine
//! - Transaction ledger entities with the payment state machine and the
//!   append-only payment attempt audit trail
//! - Pricing policy for commission and delivery fee computation
//!
//! Workflow validation and side effects live in the saga crate; entities
//! here only guard their own transitions.

pub mod error;
pub mod order;
pub mod pricing;
pub mod transaction;

pub use error::{OrderError, TransactionError};
pub use order::{DeliveryInfo, NewOrder, Order, OrderItem, OrderStatus};
pub use pricing::PricingPolicy;
pub use transaction::{
    PaymentAttempt, PaymentMethod, Transaction, TransactionStatus, TransactionType,
};
