//! Identity service trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::UserId;

use crate::error::SagaError;

/// A buyer or farmer as the identity service knows them.
#[derive(Debug, Clone)]
pub struct Party {
    /// The party's identifier.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Profile latitude, if set.
    pub latitude: Option<f64>,
    /// Profile longitude, if set.
    pub longitude: Option<f64>,
}

/// Trait for user lookups against the identity service.
///
/// `Ok(None)` means the user does not exist; `Err` means the service
/// could not be reached.
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Looks up a user by ID.
    async fn get_user(&self, user_id: &UserId) -> Result<Option<Party>, SagaError>;
}

#[derive(Debug, Default)]
struct InMemoryIdentityState {
    users: HashMap<UserId, Party>,
    unavailable: bool,
}

/// In-memory identity service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIdentityService {
    state: Arc<RwLock<InMemoryIdentityState>>,
}

impl InMemoryIdentityService {
    /// Creates a new empty identity service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a user.
    pub fn add_user(&self, party: Party) {
        let mut state = self.state.write().unwrap();
        state.users.insert(party.id.clone(), party);
    }

    /// Registers a user with just an ID and name.
    pub fn add_simple_user(&self, id: impl Into<UserId>, name: impl Into<String>) {
        self.add_user(Party {
            id: id.into(),
            name: name.into(),
            latitude: None,
            longitude: None,
        });
    }

    /// Makes all lookups fail as if the service were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.write().unwrap().unavailable = unavailable;
    }
}

#[async_trait]
impl IdentityService for InMemoryIdentityService {
    async fn get_user(&self, user_id: &UserId) -> Result<Option<Party>, SagaError> {
        let state = self.state.read().unwrap();
        if state.unavailable {
            return Err(SagaError::DownstreamUnavailable {
                service: "identity",
                reason: "connection refused".to_string(),
            });
        }
        Ok(state.users.get(user_id).cloned())
    }
}
