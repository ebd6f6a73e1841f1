//! Persistence contract for the terra-orders service.
//!
//! The real store is an external collaborator assumed to offer atomic
//! read-modify-write per aggregate. This crate defines the traits the
//! core consumes and an in-memory implementation used by tests and local
//! runs. Updates carry the version the caller read; a concurrent writer
//! makes the slower one fail with [`StoreError::VersionConflict`].

pub mod error;
pub mod memory;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::{InMemoryOrderStore, InMemoryTransactionStore};
pub use store::{OrderStore, TransactionStore};
