//! Event publication for the order service.
//!
//! Events are wrapped in a versioned envelope and published to a topic
//! exchange through a [`MessageBroker`]. The [`EventPublisher`] retries
//! transient failures with exponential backoff and reports the outcome
//! as a boolean so callers never fail a business operation over a
//! publication error. Delivery is at-least-once at best: an event can
//! still be lost if the broker is down for longer than the retry window.

pub mod broker;
pub mod envelope;
pub mod publisher;

pub use broker::{BrokerError, InMemoryBroker, MessageBroker, PublishedMessage};
pub use envelope::{EventEnvelope, EVENTS_EXCHANGE, SCHEMA_VERSION, SERVICE_NAME};
pub use publisher::{EventPublisher, RetryPolicy};
