//! Versioned event envelope shared by all published events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Topic exchange all order events are published to.
pub const EVENTS_EXCHANGE: &str = "terra_events";

/// Identifies this service in the envelope.
pub const SERVICE_NAME: &str = "terra-order-service";

/// Envelope schema version.
pub const SCHEMA_VERSION: &str = "1.0";

/// Wraps an event payload with routing and provenance metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event_type: String,
    pub service: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub data: Value,
}

impl EventEnvelope {
    /// Wraps a payload, stamping this service's identity and the current time.
    pub fn new(event_type: impl Into<String>, data: Value) -> Self {
        Self {
            event_type: event_type.into(),
            service: SERVICE_NAME.to_string(),
            timestamp: Utc::now(),
            version: SCHEMA_VERSION.to_string(),
            data,
        }
    }
}
