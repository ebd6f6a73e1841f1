//! Transaction status machine and classification enums.

use serde::{Deserialize, Serialize};

/// The status of a financial transaction.
///
/// Status transitions:
/// ```text
/// Pending ──► Processing ──┬──► Success ──► Reversed
///                          └──► Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    /// Transaction created, not yet handed to a provider.
    #[default]
    Pending,

    /// A payment attempt is in flight.
    Processing,

    /// The provider confirmed the transaction (decided).
    Success,

    /// The provider declined the transaction (decided, terminal).
    Failed,

    /// A successful transaction was reversed by a refund (terminal).
    Reversed,
}

impl TransactionStatus {
    /// Returns true if processing can start in this status.
    pub fn can_process(&self) -> bool {
        matches!(self, TransactionStatus::Pending)
    }

    /// Returns true if the transaction can be decided in this status.
    pub fn can_decide(&self) -> bool {
        matches!(self, TransactionStatus::Processing)
    }

    /// Returns true if the transaction can be reversed in this status.
    pub fn can_reverse(&self) -> bool {
        matches!(self, TransactionStatus::Success)
    }

    /// Returns true if the transaction reached an outcome.
    pub fn is_decided(&self) -> bool {
        matches!(
            self,
            TransactionStatus::Success | TransactionStatus::Failed | TransactionStatus::Reversed
        )
    }

    /// Returns the wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "PENDING",
            TransactionStatus::Processing => "PROCESSING",
            TransactionStatus::Success => "SUCCESS",
            TransactionStatus::Failed => "FAILED",
            TransactionStatus::Reversed => "REVERSED",
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a transaction represents in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Buyer pays for an order.
    Payment,
    /// A payment is returned to the buyer.
    Refund,
    /// Platform commission withheld from a payout.
    Commission,
    /// Farmer payout after order completion.
    Payout,
}

impl TransactionType {
    /// Returns the wire name of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Payment => "PAYMENT",
            TransactionType::Refund => "REFUND",
            TransactionType::Commission => "COMMISSION",
            TransactionType::Payout => "PAYOUT",
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a transaction is settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    MobileMoney,
    OrangeMoney,
    MtnMomo,
    Cash,
    BankTransfer,
}

impl PaymentMethod {
    /// Returns the wire name of the method.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::MobileMoney => "MOBILE_MONEY",
            PaymentMethod::OrangeMoney => "ORANGE_MONEY",
            PaymentMethod::MtnMomo => "MTN_MOMO",
            PaymentMethod::Cash => "CASH",
            PaymentMethod::BankTransfer => "BANK_TRANSFER",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_is_pending() {
        assert_eq!(TransactionStatus::default(), TransactionStatus::Pending);
    }

    #[test]
    fn test_only_pending_can_process() {
        assert!(TransactionStatus::Pending.can_process());
        assert!(!TransactionStatus::Processing.can_process());
        assert!(!TransactionStatus::Success.can_process());
        assert!(!TransactionStatus::Failed.can_process());
    }

    #[test]
    fn test_only_processing_can_decide() {
        assert!(TransactionStatus::Processing.can_decide());
        assert!(!TransactionStatus::Pending.can_decide());
        assert!(!TransactionStatus::Success.can_decide());
    }

    #[test]
    fn test_only_success_can_reverse() {
        assert!(TransactionStatus::Success.can_reverse());
        assert!(!TransactionStatus::Pending.can_reverse());
        assert!(!TransactionStatus::Failed.can_reverse());
        assert!(!TransactionStatus::Reversed.can_reverse());
    }

    #[test]
    fn test_decided_statuses() {
        assert!(!TransactionStatus::Pending.is_decided());
        assert!(!TransactionStatus::Processing.is_decided());
        assert!(TransactionStatus::Success.is_decided());
        assert!(TransactionStatus::Failed.is_decided());
        assert!(TransactionStatus::Reversed.is_decided());
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(TransactionStatus::Processing.to_string(), "PROCESSING");
        assert_eq!(TransactionType::Payout.to_string(), "PAYOUT");
        assert_eq!(PaymentMethod::MtnMomo.to_string(), "MTN_MOMO");
        assert_eq!(
            serde_json::to_string(&PaymentMethod::OrangeMoney).unwrap(),
            "\"ORANGE_MONEY\""
        );
    }
}
