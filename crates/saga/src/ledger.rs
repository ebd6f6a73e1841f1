//! Transaction ledger: creates transactions and drives their state
//! machine through the payment processor.

use std::sync::Arc;

use common::UserId;
use domain::{Order, PaymentMethod, Transaction, TransactionType};
use serde_json::json;
use store::TransactionStore;
use tracing::info;

use crate::error::Result;
use crate::payment::PaymentProcessor;

/// Platform ledger account used as the payer on payouts.
pub const PLATFORM_ACCOUNT: &str = "terra-platform";

/// Creates and processes transactions for the saga.
#[derive(Clone)]
pub struct TransactionLedger {
    transactions: Arc<dyn TransactionStore>,
    processor: Arc<dyn PaymentProcessor>,
}

impl TransactionLedger {
    /// Creates a ledger over a transaction store and a payment processor.
    pub fn new(
        transactions: Arc<dyn TransactionStore>,
        processor: Arc<dyn PaymentProcessor>,
    ) -> Self {
        Self {
            transactions,
            processor,
        }
    }

    /// Creates a PENDING payment transaction for an order's total, from
    /// the buyer to the farmer.
    pub async fn create_payment(
        &self,
        order: &Order,
        method: PaymentMethod,
    ) -> Result<Transaction> {
        let transaction = Transaction::new(
            order.id(),
            TransactionType::Payment,
            method,
            order.total(),
            order.buyer_id().clone(),
            order.farmer_id().clone(),
            format!("Payment for order {}", order.order_number()),
        );
        self.transactions.insert(&transaction).await?;
        Ok(transaction)
    }

    /// Runs one payment attempt through the processor, recording exactly
    /// one `PaymentAttempt` and deciding the transaction. Returns whether
    /// the payment succeeded.
    pub async fn process_payment(&self, transaction: &mut Transaction) -> Result<bool> {
        transaction.begin_processing()?;
        self.transactions.update(transaction).await?;

        let request = json!({
            "reference": transaction.reference(),
            "amount": transaction.amount().to_string(),
            "method": transaction.payment_method(),
            "payer": transaction.payer_id().to_string(),
        });
        let outcome = self.processor.process(transaction).await;

        let attempt_number = transaction.record_attempt(
            Some(request),
            Some(outcome.response.clone()),
            outcome.success,
            outcome.error.clone(),
        );

        if outcome.success {
            transaction.succeed(outcome.provider_transaction_id, outcome.response)?;
        } else {
            let reason = outcome
                .error
                .unwrap_or_else(|| "Payment failed".to_string());
            transaction.fail(reason, Some(outcome.response))?;
        }
        self.transactions.update(transaction).await?;

        info!(
            reference = transaction.reference(),
            attempt = attempt_number,
            status = transaction.status().as_str(),
            "payment attempt recorded"
        );
        Ok(outcome.success)
    }

    /// Creates a PENDING payout transaction for the farmer's share of a
    /// completed order (total less the platform commission). Payout
    /// execution belongs to the payment collaborator, not this service.
    pub async fn create_payout(&self, order: &Order) -> Result<Transaction> {
        let commission = order.platform_commission().unwrap_or_default();
        let transaction = Transaction::new(
            order.id(),
            TransactionType::Payout,
            PaymentMethod::BankTransfer,
            order.total() - commission,
            UserId::new(PLATFORM_ACCOUNT),
            order.farmer_id().clone(),
            format!("Farmer payout for order {}", order.order_number()),
        );
        self.transactions.insert(&transaction).await?;
        Ok(transaction)
    }

    /// Reverses a successful transaction for refund bookkeeping.
    pub async fn reverse(&self, transaction: &mut Transaction) -> Result<()> {
        transaction.reverse()?;
        self.transactions.update(transaction).await?;
        Ok(())
    }
}
