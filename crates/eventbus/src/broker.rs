//! Message broker abstraction and in-memory implementation.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors surfaced by a message broker.
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("broker connection unavailable: {0}")]
    ConnectionFailed(String),

    #[error("publish to exchange '{exchange}' failed: {reason}")]
    PublishFailed { exchange: String, reason: String },
}

/// Minimal broker surface the publisher needs: a durable topic exchange
/// and persistent message publication.
#[async_trait]
pub trait MessageBroker: Send + Sync {
    /// Declares a durable topic exchange, idempotently.
    async fn declare_exchange(&self, exchange: &str) -> Result<(), BrokerError>;

    /// Publishes a message body to an exchange under a routing key.
    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        body: &[u8],
        persistent: bool,
    ) -> Result<(), BrokerError>;
}

/// A message captured by the in-memory broker.
#[derive(Debug, Clone)]
pub struct PublishedMessage {
    pub exchange: String,
    pub routing_key: String,
    pub body: Vec<u8>,
    pub persistent: bool,
}

#[derive(Default)]
struct BrokerState {
    exchanges: HashSet<String>,
    published: Vec<PublishedMessage>,
    fail_publishes: u32,
}

/// In-memory broker for tests and local runs. Records every published
/// message and can be told to fail the next N publish attempts.
#[derive(Clone, Default)]
pub struct InMemoryBroker {
    state: Arc<RwLock<BrokerState>>,
}

impl InMemoryBroker {
    /// Creates a new empty broker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` publish calls fail.
    pub async fn fail_next_publishes(&self, count: u32) {
        self.state.write().await.fail_publishes = count;
    }

    /// Returns all captured messages in publication order.
    pub async fn published(&self) -> Vec<PublishedMessage> {
        self.state.read().await.published.clone()
    }

    /// Returns captured messages for one routing key.
    pub async fn published_for(&self, routing_key: &str) -> Vec<PublishedMessage> {
        self.state
            .read()
            .await
            .published
            .iter()
            .filter(|m| m.routing_key == routing_key)
            .cloned()
            .collect()
    }

    /// Returns whether an exchange has been declared.
    pub async fn has_exchange(&self, exchange: &str) -> bool {
        self.state.read().await.exchanges.contains(exchange)
    }
}

#[async_trait]
impl MessageBroker for InMemoryBroker {
    async fn declare_exchange(&self, exchange: &str) -> Result<(), BrokerError> {
        self.state.write().await.exchanges.insert(exchange.to_string());
        Ok(())
    }

    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        body: &[u8],
        persistent: bool,
    ) -> Result<(), BrokerError> {
        let mut state = self.state.write().await;
        if state.fail_publishes > 0 {
            state.fail_publishes -= 1;
            return Err(BrokerError::PublishFailed {
                exchange: exchange.to_string(),
                reason: "injected failure".to_string(),
            });
        }
        state.published.push(PublishedMessage {
            exchange: exchange.to_string(),
            routing_key: routing_key.to_string(),
            body: body.to_vec(),
            persistent,
        });
        Ok(())
    }
}
