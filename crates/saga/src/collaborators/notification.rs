//! Notification service trait and in-memory implementation.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::UserId;
use serde_json::Value;

/// A notification to fan out to a buyer or farmer.
#[derive(Debug, Clone)]
pub struct Notification {
    /// Who receives the notification.
    pub recipient: UserId,
    /// Template identifier understood by the notification service.
    pub template: &'static str,
    /// Template data.
    pub data: Value,
}

/// Trait for fire-and-forget notification delivery.
///
/// Returns whether the notification was accepted. Callers never fail a
/// saga over a notification outcome.
#[async_trait]
pub trait NotificationService: Send + Sync {
    /// Sends one notification.
    async fn send(&self, notification: Notification) -> bool;
}

#[derive(Debug, Default)]
struct InMemoryNotificationState {
    sent: Vec<Notification>,
    fail_on_send: bool,
}

/// In-memory notification service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotificationService {
    state: Arc<RwLock<InMemoryNotificationState>>,
}

impl InMemoryNotificationService {
    /// Creates a new in-memory notification service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes sends report failure.
    pub fn set_fail_on_send(&self, fail: bool) {
        self.state.write().unwrap().fail_on_send = fail;
    }

    /// Returns the number of accepted notifications.
    pub fn sent_count(&self) -> usize {
        self.state.read().unwrap().sent.len()
    }

    /// Returns accepted notifications for one recipient.
    pub fn sent_to(&self, recipient: &UserId) -> Vec<Notification> {
        self.state
            .read()
            .unwrap()
            .sent
            .iter()
            .filter(|n| &n.recipient == recipient)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl NotificationService for InMemoryNotificationService {
    async fn send(&self, notification: Notification) -> bool {
        let mut state = self.state.write().unwrap();
        if state.fail_on_send {
            return false;
        }
        state.sent.push(notification);
        true
    }
}
