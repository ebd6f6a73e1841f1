//! Transaction and payment attempt entities.

use chrono::{DateTime, Utc};
use common::{Money, OrderId, TransactionId, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TransactionError;

use super::{PaymentMethod, TransactionStatus, TransactionType};

/// One payment attempt against a provider, kept for audit.
///
/// Attempts are append-only: once recorded they are never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentAttempt {
    /// 1-based attempt number, monotonic per transaction.
    pub attempt_number: u32,
    /// When the attempt was made.
    pub attempted_at: DateTime<Utc>,
    /// Snapshot of the request sent to the provider.
    pub request_data: Option<serde_json::Value>,
    /// Snapshot of the provider response.
    pub response_data: Option<serde_json::Value>,
    /// Whether the provider confirmed the attempt.
    pub success: bool,
    /// Provider error message for failed attempts.
    pub error_message: Option<String>,
}

/// A financial transaction in the ledger.
///
/// Transactions reference an order but are not owned by it: they survive
/// order cancellation for audit purposes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    id: TransactionId,
    reference: String,
    order_id: OrderId,

    transaction_type: TransactionType,
    payment_method: PaymentMethod,
    amount: Money,

    payer_id: UserId,
    payee_id: UserId,

    status: TransactionStatus,
    created_at: DateTime<Utc>,
    processed_at: Option<DateTime<Utc>>,

    provider_transaction_id: Option<String>,
    provider_response: Option<serde_json::Value>,

    description: String,
    failure_reason: Option<String>,

    attempts: Vec<PaymentAttempt>,
}

impl Transaction {
    /// Creates a PENDING transaction with a fresh unique reference.
    pub fn new(
        order_id: OrderId,
        transaction_type: TransactionType,
        payment_method: PaymentMethod,
        amount: Money,
        payer_id: UserId,
        payee_id: UserId,
        description: impl Into<String>,
    ) -> Self {
        let created_at = Utc::now();
        Self {
            id: TransactionId::new(),
            reference: generate_reference(created_at),
            order_id,
            transaction_type,
            payment_method,
            amount,
            payer_id,
            payee_id,
            status: TransactionStatus::Pending,
            created_at,
            processed_at: None,
            provider_transaction_id: None,
            provider_response: None,
            description: description.into(),
            failure_reason: None,
            attempts: Vec::new(),
        }
    }

    /// Returns the transaction ID.
    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Returns the unique transaction reference.
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Returns the owning order reference.
    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    /// Returns the transaction type.
    pub fn transaction_type(&self) -> TransactionType {
        self.transaction_type
    }

    /// Returns the payment method.
    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    /// Returns the amount.
    pub fn amount(&self) -> Money {
        self.amount
    }

    /// Returns the paying party.
    pub fn payer_id(&self) -> &UserId {
        &self.payer_id
    }

    /// Returns the receiving party.
    pub fn payee_id(&self) -> &UserId {
        &self.payee_id
    }

    /// Returns the current status.
    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    /// Returns when the transaction was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the transaction was decided, if it has been.
    pub fn processed_at(&self) -> Option<DateTime<Utc>> {
        self.processed_at
    }

    /// Returns the provider's transaction identifier, if any.
    pub fn provider_transaction_id(&self) -> Option<&str> {
        self.provider_transaction_id.as_deref()
    }

    /// Returns the raw provider response, if any.
    pub fn provider_response(&self) -> Option<&serde_json::Value> {
        self.provider_response.as_ref()
    }

    /// Returns the human description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the failure reason for failed transactions.
    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    /// Returns the recorded payment attempts, oldest first.
    pub fn attempts(&self) -> &[PaymentAttempt] {
        &self.attempts
    }

    /// Moves a pending transaction into PROCESSING.
    pub fn begin_processing(&mut self) -> Result<(), TransactionError> {
        if !self.status.can_process() {
            return Err(self.invalid("process"));
        }
        self.status = TransactionStatus::Processing;
        Ok(())
    }

    /// Decides the transaction as SUCCESS, stamping `processed_at`.
    pub fn succeed(
        &mut self,
        provider_transaction_id: Option<String>,
        provider_response: serde_json::Value,
    ) -> Result<(), TransactionError> {
        if !self.status.can_decide() {
            return Err(self.invalid("decide"));
        }
        self.status = TransactionStatus::Success;
        self.provider_transaction_id = provider_transaction_id;
        self.provider_response = Some(provider_response);
        self.processed_at = Some(Utc::now());
        Ok(())
    }

    /// Decides the transaction as FAILED, stamping `processed_at`.
    pub fn fail(
        &mut self,
        reason: impl Into<String>,
        provider_response: Option<serde_json::Value>,
    ) -> Result<(), TransactionError> {
        if !self.status.can_decide() {
            return Err(self.invalid("decide"));
        }
        self.status = TransactionStatus::Failed;
        self.failure_reason = Some(reason.into());
        self.provider_response = provider_response;
        self.processed_at = Some(Utc::now());
        Ok(())
    }

    /// Reverses a successful transaction (refund bookkeeping).
    pub fn reverse(&mut self) -> Result<(), TransactionError> {
        if !self.status.can_reverse() {
            return Err(self.invalid("reverse"));
        }
        self.status = TransactionStatus::Reversed;
        Ok(())
    }

    /// Appends a payment attempt and returns its monotonic number.
    pub fn record_attempt(
        &mut self,
        request_data: Option<serde_json::Value>,
        response_data: Option<serde_json::Value>,
        success: bool,
        error_message: Option<String>,
    ) -> u32 {
        let attempt_number = self.attempts.len() as u32 + 1;
        self.attempts.push(PaymentAttempt {
            attempt_number,
            attempted_at: Utc::now(),
            request_data,
            response_data,
            success,
            error_message,
        });
        attempt_number
    }

    fn invalid(&self, action: &'static str) -> TransactionError {
        TransactionError::InvalidTransition {
            current: self.status,
            action,
        }
    }
}

/// Generates a unique transaction reference: `TXN` + timestamp + suffix.
fn generate_reference(created_at: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string()[..6].to_uppercase();
    format!("TXN{}{}", created_at.format("%Y%m%d%H%M%S"), suffix)
}
