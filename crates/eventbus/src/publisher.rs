//! Retrying event publisher.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use crate::broker::MessageBroker;
use crate::envelope::{EventEnvelope, EVENTS_EXCHANGE};

/// Bounded exponential backoff for publish attempts.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Delay before the given retry, doubling from the base and capped.
    fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Publishes enveloped events to the broker, retrying transient failures.
///
/// Publication is best-effort: a failure after all retries is logged and
/// reported as `false`, never as an error, so the business operation that
/// produced the event still commits.
#[derive(Clone)]
pub struct EventPublisher {
    broker: Arc<dyn MessageBroker>,
    retry: RetryPolicy,
}

impl EventPublisher {
    /// Creates a publisher over a broker with the given retry policy.
    pub fn new(broker: Arc<dyn MessageBroker>, retry: RetryPolicy) -> Self {
        Self { broker, retry }
    }

    /// Declares the events exchange eagerly, surfacing broker trouble at
    /// startup instead of on the first publish.
    pub async fn ensure_exchange(&self) -> bool {
        match self.broker.declare_exchange(EVENTS_EXCHANGE).await {
            Ok(()) => true,
            Err(error) => {
                warn!(exchange = EVENTS_EXCHANGE, %error, "exchange declaration failed");
                false
            }
        }
    }

    /// Wraps a payload in the service envelope and publishes it under the
    /// given routing key. Returns whether the publish ultimately succeeded.
    pub async fn publish(&self, routing_key: &str, event_type: &str, data: Value) -> bool {
        let envelope = EventEnvelope::new(event_type, data);
        let body = match serde_json::to_vec(&envelope) {
            Ok(body) => body,
            Err(error) => {
                warn!(event_type, %error, "event serialization failed");
                return false;
            }
        };

        for attempt in 1..=self.retry.max_attempts {
            // Declaration is idempotent; each attempt re-asserts the exchange.
            let result = match self.broker.declare_exchange(EVENTS_EXCHANGE).await {
                Ok(()) => {
                    self.broker
                        .publish(EVENTS_EXCHANGE, routing_key, &body, true)
                        .await
                }
                Err(error) => Err(error),
            };
            match result {
                Ok(()) => {
                    debug!(routing_key, event_type, attempt, "event published");
                    metrics::counter!("events_published_total").increment(1);
                    return true;
                }
                Err(error) => {
                    warn!(routing_key, event_type, attempt, %error, "event publish failed");
                    if attempt < self.retry.max_attempts {
                        tokio::time::sleep(self.retry.delay_for(attempt)).await;
                    }
                }
            }
        }

        metrics::counter!("events_dropped_total").increment(1);
        false
    }
}
