//! Pluggable payment processing.

use async_trait::async_trait;
use domain::Transaction;
use rand::Rng;
use serde_json::{json, Value};
use uuid::Uuid;

/// Outcome of one payment processor invocation.
#[derive(Debug, Clone)]
pub struct PaymentOutcome {
    /// Whether the provider accepted the payment.
    pub success: bool,
    /// Provider-side transaction identifier, on success.
    pub provider_transaction_id: Option<String>,
    /// Raw provider response for the audit trail.
    pub response: Value,
    /// Provider failure message, on failure.
    pub error: Option<String>,
}

/// Trait for payment providers. The real mobile-money integration is an
/// external collaborator; a simulated processor stands in for it.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Processes a payment for a transaction. Returns an outcome, never
    /// an error; provider trouble is a failed outcome.
    async fn process(&self, transaction: &Transaction) -> PaymentOutcome;
}

/// Simulated payment processor drawing success from a configurable
/// probability.
#[derive(Debug, Clone)]
pub struct SimulatedPaymentProcessor {
    success_rate: f64,
}

impl SimulatedPaymentProcessor {
    /// Creates a processor succeeding with the given probability,
    /// clamped to `[0.0, 1.0]`.
    pub fn new(success_rate: f64) -> Self {
        Self {
            success_rate: success_rate.clamp(0.0, 1.0),
        }
    }

    /// A processor that always succeeds.
    pub fn always_succeeds() -> Self {
        Self::new(1.0)
    }

    /// A processor that always fails.
    pub fn always_fails() -> Self {
        Self::new(0.0)
    }
}

impl Default for SimulatedPaymentProcessor {
    fn default() -> Self {
        Self::new(0.9)
    }
}

#[async_trait]
impl PaymentProcessor for SimulatedPaymentProcessor {
    async fn process(&self, transaction: &Transaction) -> PaymentOutcome {
        let success = rand::thread_rng().gen_bool(self.success_rate);

        if success {
            let provider_id = format!(
                "PMT{}",
                &Uuid::new_v4().simple().to_string()[..8].to_uppercase()
            );
            PaymentOutcome {
                success: true,
                provider_transaction_id: Some(provider_id.clone()),
                response: json!({
                    "status": "SUCCESS",
                    "provider_transaction_id": provider_id,
                    "reference": transaction.reference(),
                    "amount": transaction.amount().to_string(),
                    "method": transaction.payment_method(),
                }),
                error: None,
            }
        } else {
            PaymentOutcome {
                success: false,
                provider_transaction_id: None,
                response: json!({
                    "status": "FAILED",
                    "reference": transaction.reference(),
                    "message": "Payment declined by provider",
                }),
                error: Some("Payment declined by provider".to_string()),
            }
        }
    }
}
