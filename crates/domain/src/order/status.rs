//! Order status state machine.

use serde::{Deserialize, Serialize};

/// The status of an order in its lifecycle.
///
/// Status transitions:
/// ```text
/// Pending ──► Confirmed ──► Paid ──► InDelivery ──► Delivered ──► Completed
///    │            │          │           │
///    └────────────┴──────────┴───────────┴──► Cancelled
/// ```
///
/// `Delivered` and `Completed` orders can no longer be cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Order created, awaiting farmer confirmation.
    #[default]
    Pending,

    /// Farmer confirmed the order, awaiting payment.
    Confirmed,

    /// Payment succeeded, awaiting delivery pickup.
    Paid,

    /// A courier has picked up the order.
    InDelivery,

    /// The order reached the buyer.
    Delivered,

    /// Buyer acknowledged the order; farmer payout may be initiated
    /// (terminal state).
    Completed,

    /// Order was cancelled (terminal state).
    Cancelled,
}

impl OrderStatus {
    /// Returns true if the order can be confirmed in this status.
    pub fn can_confirm(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Returns true if payment can be processed in this status.
    pub fn can_pay(&self) -> bool {
        matches!(self, OrderStatus::Confirmed)
    }

    /// Returns true if delivery can start in this status.
    pub fn can_start_delivery(&self) -> bool {
        matches!(self, OrderStatus::Paid)
    }

    /// Returns true if the order can be marked delivered in this status.
    pub fn can_mark_delivered(&self) -> bool {
        matches!(self, OrderStatus::InDelivery)
    }

    /// Returns true if the order can be completed in this status.
    pub fn can_complete(&self) -> bool {
        matches!(self, OrderStatus::Delivered)
    }

    /// Returns true if the order can be cancelled in this status.
    pub fn can_cancel(&self) -> bool {
        matches!(
            self,
            OrderStatus::Pending
                | OrderStatus::Confirmed
                | OrderStatus::Paid
                | OrderStatus::InDelivery
        )
    }

    /// Returns true if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Returns the wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Paid => "PAID",
            OrderStatus::InDelivery => "IN_DELIVERY",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
