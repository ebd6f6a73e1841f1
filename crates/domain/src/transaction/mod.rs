//! Transaction ledger: financial transactions and payment attempts.

mod ledger;
mod status;

pub use ledger::{PaymentAttempt, Transaction};
pub use status::{PaymentMethod, TransactionStatus, TransactionType};
