//! Order fulfillment saga for the terra marketplace.
//!
//! Coordinates a multi-party commerce transaction across independently
//! owned services: creating an order reserves stock in the remote
//! catalog and validates both parties; payment, cancellation, delivery
//! and completion each trigger their own downstream or compensating
//! actions. There is no two-phase commit anywhere; forward steps are
//! undone by explicit compensation (stock release) and other services
//! learn of changes through at-least-once event publication.

pub mod collaborators;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod ledger;
pub mod locks;
pub mod payment;
pub mod stock;
pub mod sweeper;

pub use coordinator::{
    CreateOrderRequest, DeliveryEvent, DeliveryStatusUpdate, OrderItemRequest, OrderSaga,
    PaymentRequest,
};
pub use error::{Result, SagaError};
pub use ledger::TransactionLedger;
pub use locks::OrderLocks;
pub use payment::{PaymentOutcome, PaymentProcessor, SimulatedPaymentProcessor};
pub use stock::StockCoordinator;
pub use sweeper::{ExpirySweeper, SweepReport, EXPIRY_REASON};
