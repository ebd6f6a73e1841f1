//! Shared types for the terra-orders service.
//!
//! Identifiers are newtypes so order, transaction, user and product
//! references cannot be mixed up. Monetary amounts and quantities are
//! fixed-point integers; floating point never touches money.

pub mod ids;
pub mod money;
pub mod version;

pub use ids::{OrderId, ProductId, TransactionId, UserId};
pub use money::{Money, Quantity};
pub use version::Version;
