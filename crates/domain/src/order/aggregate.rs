//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::{Money, OrderId, ProductId, Quantity, UserId, Version};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::OrderError;
use crate::pricing::PricingPolicy;

use super::OrderStatus;

/// An item in an order, with the product details snapshotted at order time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    /// The product in the catalog service.
    pub product_id: ProductId,

    /// Product name at order time.
    pub product_name: String,

    /// Product category at order time.
    pub product_category: String,

    /// Quantity ordered.
    pub quantity: Quantity,

    /// Unit of measure (e.g. "kg").
    pub unit: String,

    /// Price per unit at order time.
    pub unit_price: Money,

    /// `quantity * unit_price`, computed at construction.
    pub total_price: Money,

    /// Product image at order time, if any.
    pub image_url: Option<String>,

    /// Free-text item notes.
    pub notes: Option<String>,
}

impl OrderItem {
    /// Creates a new order item, computing its total price.
    pub fn new(
        product_id: impl Into<ProductId>,
        product_name: impl Into<String>,
        product_category: impl Into<String>,
        quantity: Quantity,
        unit: impl Into<String>,
        unit_price: Money,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            product_name: product_name.into(),
            product_category: product_category.into(),
            quantity,
            unit: unit.into(),
            unit_price,
            total_price: unit_price.times(quantity),
            image_url: None,
            notes: None,
        }
    }
}

/// Delivery destination for an order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeliveryInfo {
    /// Free-text delivery address.
    pub address: String,
    /// Destination latitude, if geocoded.
    pub latitude: Option<f64>,
    /// Destination longitude, if geocoded.
    pub longitude: Option<f64>,
}

/// Input for creating an order, before items are resolved.
#[derive(Debug, Clone)]
pub struct NewOrder {
    /// The buyer placing the order.
    pub buyer_id: UserId,
    /// The farmer fulfilling the order.
    pub farmer_id: UserId,
    /// Where the order should be delivered.
    pub delivery: DeliveryInfo,
    /// Pickup latitude from the farmer's profile.
    pub farmer_latitude: Option<f64>,
    /// Pickup longitude from the farmer's profile.
    pub farmer_longitude: Option<f64>,
    /// Free-text buyer notes.
    pub buyer_notes: Option<String>,
}

/// Order aggregate root.
///
/// A passive record: the saga validates workflows and drives transitions;
/// the aggregate only guards its own status machine and derived fields.
/// Orders are never hard-deleted — cancellation is a status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    order_number: String,

    /// Store version for optimistic concurrency.
    #[serde(default)]
    version: Version,

    buyer_id: UserId,
    farmer_id: UserId,

    status: OrderStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    confirmed_at: Option<DateTime<Utc>>,
    paid_at: Option<DateTime<Utc>>,
    delivered_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,

    subtotal: Money,
    delivery_fee: Money,
    /// Computed once on first save, never recomputed.
    platform_commission: Option<Money>,
    total: Money,

    delivery: DeliveryInfo,
    delivery_id: Option<String>,
    farmer_latitude: Option<f64>,
    farmer_longitude: Option<f64>,

    buyer_notes: Option<String>,
    cancellation_reason: Option<String>,

    items: Vec<OrderItem>,
}

impl Order {
    /// Creates a new PENDING order from resolved items, validating them and
    /// computing all derived monetary fields.
    pub fn create(
        new: NewOrder,
        items: Vec<OrderItem>,
        policy: &PricingPolicy,
    ) -> Result<Self, OrderError> {
        if items.is_empty() {
            return Err(OrderError::NoItems);
        }

        for item in &items {
            if !item.quantity.is_positive() {
                return Err(OrderError::InvalidQuantity {
                    product_id: item.product_id.to_string(),
                    quantity: item.quantity.to_string(),
                });
            }
            if !item.unit_price.is_positive() {
                return Err(OrderError::InvalidPrice {
                    product_id: item.product_id.to_string(),
                    unit_price: item.unit_price.to_string(),
                });
            }
        }

        let subtotal: Money = items.iter().map(|i| i.total_price).sum();
        let now = Utc::now();

        let mut order = Self {
            id: OrderId::new(),
            order_number: String::new(),
            version: Version::initial(),
            buyer_id: new.buyer_id,
            farmer_id: new.farmer_id,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
            confirmed_at: None,
            paid_at: None,
            delivered_at: None,
            completed_at: None,
            cancelled_at: None,
            subtotal,
            delivery_fee: Money::zero(),
            platform_commission: None,
            total: Money::zero(),
            delivery: new.delivery,
            delivery_id: None,
            farmer_latitude: new.farmer_latitude,
            farmer_longitude: new.farmer_longitude,
            buyer_notes: new.buyer_notes,
            cancellation_reason: None,
            items,
        };
        order.recompute_derived(policy);
        Ok(order)
    }

    /// Recomputes derived fields, preserving anything already set:
    /// the order number is assigned once, the commission is computed only
    /// while unset, the delivery fee only while at its zero default, and
    /// the total is always recomputed last.
    pub fn recompute_derived(&mut self, policy: &PricingPolicy) {
        if self.order_number.is_empty() {
            self.order_number = generate_order_number(self.created_at);
        }
        if self.platform_commission.is_none() {
            self.platform_commission = Some(policy.commission_on(self.subtotal));
        }
        if self.delivery_fee.is_zero() {
            self.delivery_fee = policy.delivery_fee_for(self.subtotal);
        }
        self.total = self.subtotal + self.delivery_fee;
    }
}

// Query methods
impl Order {
    /// Returns the order ID.
    pub fn id(&self) -> OrderId {
        self.id
    }

    /// Returns the human-readable order number.
    pub fn order_number(&self) -> &str {
        &self.order_number
    }

    /// Returns the store version.
    pub fn version(&self) -> Version {
        self.version
    }

    /// Sets the store version. Only the store should call this.
    pub fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    /// Returns the buyer reference.
    pub fn buyer_id(&self) -> &UserId {
        &self.buyer_id
    }

    /// Returns the farmer reference.
    pub fn farmer_id(&self) -> &UserId {
        &self.farmer_id
    }

    /// Returns the current status.
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Returns when the order was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the order was confirmed, if it has been.
    pub fn confirmed_at(&self) -> Option<DateTime<Utc>> {
        self.confirmed_at
    }

    /// Returns when the order was paid, if it has been.
    pub fn paid_at(&self) -> Option<DateTime<Utc>> {
        self.paid_at
    }

    /// Returns when the order was delivered, if it has been.
    pub fn delivered_at(&self) -> Option<DateTime<Utc>> {
        self.delivered_at
    }

    /// Returns when the order was completed, if it has been.
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Returns when the order was cancelled, if it has been.
    pub fn cancelled_at(&self) -> Option<DateTime<Utc>> {
        self.cancelled_at
    }

    /// Returns the sum of item totals.
    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    /// Returns the delivery fee.
    pub fn delivery_fee(&self) -> Money {
        self.delivery_fee
    }

    /// Returns the platform commission, if derived fields have been computed.
    pub fn platform_commission(&self) -> Option<Money> {
        self.platform_commission
    }

    /// Returns the order total (`subtotal + delivery_fee`).
    pub fn total(&self) -> Money {
        self.total
    }

    /// Returns the delivery destination.
    pub fn delivery(&self) -> &DeliveryInfo {
        &self.delivery
    }

    /// Returns the logistics delivery ID, once assigned.
    pub fn delivery_id(&self) -> Option<&str> {
        self.delivery_id.as_deref()
    }

    /// Returns the farmer pickup latitude.
    pub fn farmer_latitude(&self) -> Option<f64> {
        self.farmer_latitude
    }

    /// Returns the farmer pickup longitude.
    pub fn farmer_longitude(&self) -> Option<f64> {
        self.farmer_longitude
    }

    /// Returns the buyer notes.
    pub fn buyer_notes(&self) -> Option<&str> {
        self.buyer_notes.as_deref()
    }

    /// Returns the cancellation reason, if cancelled.
    pub fn cancellation_reason(&self) -> Option<&str> {
        self.cancellation_reason.as_deref()
    }

    /// Returns the order items.
    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }
}

// Status transitions. Each guard failure leaves the order untouched.
impl Order {
    /// Confirms a pending order.
    pub fn confirm(&mut self) -> Result<(), OrderError> {
        if !self.status.can_confirm() {
            return Err(self.invalid("confirm"));
        }
        self.status = OrderStatus::Confirmed;
        self.confirmed_at = Some(Utc::now());
        self.touch();
        Ok(())
    }

    /// Marks a confirmed order as paid. The timestamp comes from the
    /// transaction's `processed_at` so the two records agree.
    pub fn mark_paid(&mut self, paid_at: DateTime<Utc>) -> Result<(), OrderError> {
        if !self.status.can_pay() {
            return Err(self.invalid("pay"));
        }
        self.status = OrderStatus::Paid;
        self.paid_at = Some(paid_at);
        self.touch();
        Ok(())
    }

    /// Marks a paid order as picked up by a courier.
    pub fn start_delivery(&mut self) -> Result<(), OrderError> {
        if !self.status.can_start_delivery() {
            return Err(self.invalid("start delivery for"));
        }
        self.status = OrderStatus::InDelivery;
        self.touch();
        Ok(())
    }

    /// Marks an in-delivery order as delivered.
    pub fn mark_delivered(&mut self) -> Result<(), OrderError> {
        if !self.status.can_mark_delivered() {
            return Err(self.invalid("mark delivered"));
        }
        self.status = OrderStatus::Delivered;
        self.delivered_at = Some(Utc::now());
        self.touch();
        Ok(())
    }

    /// Completes a delivered order.
    pub fn complete(&mut self) -> Result<(), OrderError> {
        if !self.status.can_complete() {
            return Err(self.invalid("complete"));
        }
        self.status = OrderStatus::Completed;
        self.completed_at = Some(Utc::now());
        self.touch();
        Ok(())
    }

    /// Cancels the order with a reason.
    pub fn cancel(&mut self, reason: impl Into<String>) -> Result<(), OrderError> {
        if !self.status.can_cancel() {
            return Err(self.invalid("cancel"));
        }
        self.status = OrderStatus::Cancelled;
        self.cancellation_reason = Some(reason.into());
        self.cancelled_at = Some(Utc::now());
        self.touch();
        Ok(())
    }

    /// Records the delivery ID assigned by the logistics service.
    pub fn set_delivery_id(&mut self, delivery_id: impl Into<String>) {
        self.delivery_id = Some(delivery_id.into());
        self.touch();
    }

    fn invalid(&self, action: &'static str) -> OrderError {
        OrderError::InvalidTransition {
            current: self.status,
            action,
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Generates a human-readable order number: `TRB` + timestamp + random
/// suffix. Unique and immutable once assigned.
fn generate_order_number(created_at: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string()[..4].to_uppercase();
    format!("TRB{}{}", created_at.format("%Y%m%d%H%M%S"), suffix)
}
