//! Logistics service trait and in-memory implementation.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{Money, OrderId, UserId};

/// A delivery assignment request sent to the logistics service.
#[derive(Debug, Clone)]
pub struct DeliveryRequest {
    /// The order to deliver.
    pub order_id: OrderId,
    /// The buyer receiving the delivery.
    pub buyer_id: UserId,
    /// The farmer the pickup is from.
    pub farmer_id: UserId,
    /// Pickup address latitude, if known.
    pub pickup_latitude: Option<f64>,
    /// Pickup address longitude, if known.
    pub pickup_longitude: Option<f64>,
    /// Dropoff address.
    pub dropoff_address: String,
    /// Dropoff latitude, if known.
    pub dropoff_latitude: Option<f64>,
    /// Dropoff longitude, if known.
    pub dropoff_longitude: Option<f64>,
    /// Order amount, for cash-on-delivery handling.
    pub amount: Money,
}

/// Trait for requesting deliveries.
///
/// Returns the assigned delivery ID, or `None` when the request could
/// not be placed. Delivery assignment is best-effort; callers never
/// fail an order over it.
#[async_trait]
pub trait LogisticsService: Send + Sync {
    /// Requests a delivery for a paid order.
    async fn request_delivery(&self, request: DeliveryRequest) -> Option<String>;
}

#[derive(Debug, Default)]
struct InMemoryLogisticsState {
    requests: Vec<DeliveryRequest>,
    next_id: u32,
    fail_on_request: bool,
}

/// In-memory logistics service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLogisticsService {
    state: Arc<RwLock<InMemoryLogisticsState>>,
}

impl InMemoryLogisticsService {
    /// Creates a new in-memory logistics service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes delivery requests fail.
    pub fn set_fail_on_request(&self, fail: bool) {
        self.state.write().unwrap().fail_on_request = fail;
    }

    /// Returns the number of delivery requests received.
    pub fn request_count(&self) -> usize {
        self.state.read().unwrap().requests.len()
    }

    /// Returns the recorded requests, in order.
    pub fn requests(&self) -> Vec<DeliveryRequest> {
        self.state.read().unwrap().requests.clone()
    }
}

#[async_trait]
impl LogisticsService for InMemoryLogisticsService {
    async fn request_delivery(&self, request: DeliveryRequest) -> Option<String> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_request {
            return None;
        }
        state.next_id += 1;
        let delivery_id = format!("DLV-{:04}", state.next_id);
        state.requests.push(request);
        Some(delivery_id)
    }
}
