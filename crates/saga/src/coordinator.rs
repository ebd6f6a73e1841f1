//! Order saga orchestrator.

use std::sync::Arc;

use chrono::Utc;
use common::{OrderId, ProductId, Quantity, UserId};
use domain::{
    DeliveryInfo, NewOrder, Order, OrderItem, OrderStatus, PaymentMethod, PricingPolicy,
    Transaction,
};
use eventbus::EventPublisher;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use store::{OrderStore, TransactionStore};
use tracing::{info, warn};

use crate::collaborators::{
    CatalogService, DeliveryRequest, IdentityService, LogisticsService, Notification,
    NotificationService, Party,
};
use crate::error::{Result, SagaError};
use crate::events;
use crate::ledger::TransactionLedger;
use crate::locks::OrderLocks;
use crate::payment::PaymentProcessor;
use crate::stock::StockCoordinator;

/// One requested order line: the product and how much of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemRequest {
    /// The product to order.
    pub product_id: ProductId,
    /// Quantity to order.
    pub quantity: Quantity,
}

/// Input to `create_order`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    /// The buyer placing the order.
    pub buyer_id: UserId,
    /// The farmer fulfilling the order.
    pub farmer_id: UserId,
    /// Requested order lines.
    pub items: Vec<OrderItemRequest>,
    /// Delivery destination.
    pub delivery: DeliveryInfo,
    /// Free-text buyer notes.
    #[serde(default)]
    pub buyer_notes: Option<String>,
}

/// Input to `process_payment`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    /// How the buyer pays.
    pub payment_method: PaymentMethod,
}

/// Delivery events reported by the logistics service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryEvent {
    /// The courier picked the order up from the farmer.
    PickedUp,
    /// The courier handed the order to the buyer.
    Delivered,
    /// The delivery could not be completed.
    Failed,
}

/// Input to `update_delivery_status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryStatusUpdate {
    /// What happened to the delivery.
    pub event: DeliveryEvent,
    /// The logistics delivery ID, if newly assigned.
    #[serde(default)]
    pub delivery_id: Option<String>,
}

/// Reason stamped on orders cancelled over a failed delivery.
const DELIVERY_FAILED_REASON: &str = "Delivery failed";

/// Orchestrates order workflows across the stores, the catalog, identity,
/// logistics and notification collaborators, the payment processor, and
/// the event bus.
///
/// Concurrent operations on the same order are serialized by a per-order
/// lock; the stores add an optimistic version check underneath it.
#[derive(Clone)]
pub struct OrderSaga {
    orders: Arc<dyn OrderStore>,
    transactions: Arc<dyn TransactionStore>,
    identity: Arc<dyn IdentityService>,
    catalog: Arc<dyn CatalogService>,
    logistics: Arc<dyn LogisticsService>,
    notifications: Arc<dyn NotificationService>,
    stock: StockCoordinator,
    ledger: TransactionLedger,
    publisher: EventPublisher,
    locks: OrderLocks,
    pricing: PricingPolicy,
}

impl OrderSaga {
    /// Wires the saga together from its collaborators.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        orders: Arc<dyn OrderStore>,
        transactions: Arc<dyn TransactionStore>,
        identity: Arc<dyn IdentityService>,
        catalog: Arc<dyn CatalogService>,
        logistics: Arc<dyn LogisticsService>,
        notifications: Arc<dyn NotificationService>,
        processor: Arc<dyn PaymentProcessor>,
        publisher: EventPublisher,
        pricing: PricingPolicy,
    ) -> Self {
        let ledger = TransactionLedger::new(Arc::clone(&transactions), processor);
        Self {
            orders,
            transactions,
            identity,
            catalog: Arc::clone(&catalog),
            logistics,
            notifications,
            stock: StockCoordinator::new(catalog),
            ledger,
            publisher,
            locks: OrderLocks::new(),
            pricing,
        }
    }

    /// Creates an order: validates both parties, reserves stock for every
    /// line, computes derived amounts, and persists the aggregate. On any
    /// failure after a partial reservation, every confirmed reservation is
    /// released before the original error is returned.
    #[tracing::instrument(skip(self, request), fields(buyer = %request.buyer_id, farmer = %request.farmer_id))]
    pub async fn create_order(&self, request: CreateOrderRequest) -> Result<Order> {
        metrics::counter!("order_create_attempts_total").increment(1);
        let started = std::time::Instant::now();

        let buyer = self.lookup_party("buyer", &request.buyer_id).await?;
        let farmer = self.lookup_party("farmer", &request.farmer_id).await?;

        let mut reserved: Vec<(ProductId, Quantity)> = Vec::new();
        let mut items: Vec<OrderItem> = Vec::new();
        for line in &request.items {
            let product = match self.catalog.get_product(&line.product_id).await {
                Ok(Some(product)) => product,
                Ok(None) => {
                    self.compensate(&reserved).await;
                    return Err(SagaError::ProductNotFound {
                        product_id: line.product_id.to_string(),
                    });
                }
                Err(error) => {
                    self.compensate(&reserved).await;
                    return Err(error);
                }
            };

            if !self.stock.reserve(&line.product_id, line.quantity).await {
                self.compensate(&reserved).await;
                return Err(SagaError::InsufficientStock {
                    product_id: line.product_id.to_string(),
                });
            }
            reserved.push((line.product_id.clone(), line.quantity));

            let mut item = OrderItem::new(
                product.id,
                product.name,
                product.category,
                line.quantity,
                product.unit,
                product.unit_price,
            );
            item.image_url = product.image_url;
            items.push(item);
        }

        let new = NewOrder {
            buyer_id: request.buyer_id,
            farmer_id: request.farmer_id,
            delivery: request.delivery,
            farmer_latitude: farmer.latitude,
            farmer_longitude: farmer.longitude,
            buyer_notes: request.buyer_notes,
        };
        let order = match Order::create(new, items, &self.pricing) {
            Ok(order) => order,
            Err(error) => {
                self.compensate(&reserved).await;
                return Err(error.into());
            }
        };
        if let Err(error) = self.orders.insert(&order).await {
            self.compensate(&reserved).await;
            return Err(error.into());
        }

        self.publisher
            .publish(events::ORDER_CREATED, events::ORDER_CREATED, events::order_created(&order))
            .await;

        // Notification fan-out runs off the request path; the order is
        // already committed either way.
        let saga = self.clone();
        let snapshot = order.clone();
        tokio::spawn(async move {
            saga.fan_out_created(&snapshot, &buyer, &farmer).await;
        });

        metrics::counter!("orders_created_total").increment(1);
        metrics::histogram!("order_create_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        info!(order_number = order.order_number(), total = %order.total(), "order created");
        Ok(order)
    }

    /// Confirms a pending order (the farmer accepting it).
    #[tracing::instrument(skip(self))]
    pub async fn confirm_order(&self, order_id: OrderId) -> Result<Order> {
        let _guard = self.locks.acquire(order_id).await;
        let mut order = self.load(order_id).await?;

        order.confirm()?;
        self.orders.update(&mut order).await?;

        self.publisher
            .publish(
                events::ORDER_STATUS_UPDATED,
                events::ORDER_STATUS_UPDATED,
                events::order_status_updated(&order),
            )
            .await;
        info!(order_number = order.order_number(), "order confirmed");
        Ok(order)
    }

    /// Takes a payment for a confirmed order. On success the order moves
    /// to PAID and a delivery request is placed best-effort; on a declined
    /// payment the order is left untouched and the failed transaction is
    /// kept for audit.
    #[tracing::instrument(skip(self, request))]
    pub async fn process_payment(
        &self,
        order_id: OrderId,
        request: PaymentRequest,
    ) -> Result<(Order, Transaction)> {
        let _guard = self.locks.acquire(order_id).await;
        let mut order = self.load(order_id).await?;

        if order.status() != OrderStatus::Confirmed {
            return Err(SagaError::InvalidState {
                expected: "CONFIRMED",
                actual: order.status().as_str().to_string(),
            });
        }

        let mut transaction = self
            .ledger
            .create_payment(&order, request.payment_method)
            .await?;
        let paid = self.ledger.process_payment(&mut transaction).await?;

        if !paid {
            metrics::counter!("payments_failed_total").increment(1);
            let reason = transaction
                .failure_reason()
                .unwrap_or("Payment failed")
                .to_string();
            return Err(SagaError::PaymentFailed { reason });
        }

        order.mark_paid(transaction.processed_at().unwrap_or_else(Utc::now))?;

        if let Some(delivery_id) = self.request_delivery(&order).await {
            order.set_delivery_id(delivery_id);
        }
        self.orders.update(&mut order).await?;

        self.publisher
            .publish(
                events::ORDER_PAID,
                events::ORDER_PAID,
                events::order_paid(&order, &transaction),
            )
            .await;
        self.fan_out_paid(&order, &transaction).await;

        metrics::counter!("payments_succeeded_total").increment(1);
        info!(
            order_number = order.order_number(),
            reference = transaction.reference(),
            "payment processed"
        );
        Ok((order, transaction))
    }

    /// Cancels an order, releasing its stock and announcing whether a
    /// refund is owed. Rejected for delivered or completed orders.
    #[tracing::instrument(skip(self, reason))]
    pub async fn cancel_order(&self, order_id: OrderId, reason: &str) -> Result<Order> {
        let _guard = self.locks.acquire(order_id).await;
        self.cancel_locked(order_id, reason).await
    }

    /// Completes a delivered order and initiates the farmer payout.
    #[tracing::instrument(skip(self))]
    pub async fn complete_order(&self, order_id: OrderId) -> Result<(Order, Transaction)> {
        let _guard = self.locks.acquire(order_id).await;
        let mut order = self.load(order_id).await?;

        order.complete()?;
        self.orders.update(&mut order).await?;

        let payout = self.ledger.create_payout(&order).await?;

        self.publisher
            .publish(
                events::ORDER_COMPLETED,
                events::ORDER_COMPLETED,
                events::order_completed(&order),
            )
            .await;
        self.notify(
            order.farmer_id(),
            "order_completed",
            json!({
                "order_number": order.order_number(),
                "payout_amount": payout.amount().to_string(),
            }),
        )
        .await;

        metrics::counter!("orders_completed_total").increment(1);
        info!(
            order_number = order.order_number(),
            payout = %payout.amount(),
            "order completed, payout initiated"
        );
        Ok((order, payout))
    }

    /// Applies a delivery status report from the logistics service. A
    /// failed delivery takes the same path as an explicit cancellation.
    #[tracing::instrument(skip(self, update))]
    pub async fn update_delivery_status(
        &self,
        order_id: OrderId,
        update: DeliveryStatusUpdate,
    ) -> Result<Order> {
        let _guard = self.locks.acquire(order_id).await;

        if update.event == DeliveryEvent::Failed {
            return self.cancel_locked(order_id, DELIVERY_FAILED_REASON).await;
        }

        let mut order = self.load(order_id).await?;
        if update.event == DeliveryEvent::PickedUp {
            order.start_delivery()?;
            if let Some(delivery_id) = update.delivery_id {
                order.set_delivery_id(delivery_id);
            }
        } else {
            order.mark_delivered()?;
        }
        self.orders.update(&mut order).await?;

        self.publisher
            .publish(
                events::ORDER_STATUS_UPDATED,
                events::ORDER_STATUS_UPDATED,
                events::order_status_updated(&order),
            )
            .await;
        info!(
            order_number = order.order_number(),
            status = order.status().as_str(),
            "delivery status applied"
        );
        Ok(order)
    }

    /// Loads an order by ID.
    pub async fn get_order(&self, order_id: OrderId) -> Result<Order> {
        self.load(order_id).await
    }

    /// Lists a buyer's orders, newest first.
    pub async fn orders_for_buyer(&self, buyer_id: &UserId) -> Result<Vec<Order>> {
        Ok(self.orders.list_by_buyer(buyer_id).await?)
    }

    /// Lists a farmer's orders, newest first.
    pub async fn orders_for_farmer(&self, farmer_id: &UserId) -> Result<Vec<Order>> {
        Ok(self.orders.list_by_farmer(farmer_id).await?)
    }

    /// Lists an order's transactions, newest first.
    pub async fn transactions_for_order(&self, order_id: OrderId) -> Result<Vec<Transaction>> {
        Ok(self.transactions.list_for_order(order_id).await?)
    }

    /// Lists a user's transactions as payer or payee, newest first.
    pub async fn transactions_for_user(&self, user_id: &UserId) -> Result<Vec<Transaction>> {
        Ok(self.transactions.list_for_user(user_id).await?)
    }

    /// Cancellation shared by explicit cancels, failed deliveries, and the
    /// expiry sweeper. The caller must hold the order's lock.
    pub(crate) async fn cancel_locked(&self, order_id: OrderId, reason: &str) -> Result<Order> {
        let mut order = self.load(order_id).await?;

        order.cancel(reason)?;
        self.orders.update(&mut order).await?;

        let reservations: Vec<(ProductId, Quantity)> = order
            .items()
            .iter()
            .map(|item| (item.product_id.clone(), item.quantity))
            .collect();
        self.stock.release_all(&reservations).await;

        self.publisher
            .publish(
                events::ORDER_CANCELLED,
                events::ORDER_CANCELLED,
                events::order_cancelled(&order),
            )
            .await;
        let data = json!({
            "order_number": order.order_number(),
            "reason": order.cancellation_reason(),
        });
        self.notify(order.buyer_id(), "order_cancelled", data.clone()).await;
        self.notify(order.farmer_id(), "order_cancelled", data).await;

        metrics::counter!("orders_cancelled_total").increment(1);
        info!(order_number = order.order_number(), reason, "order cancelled");
        Ok(order)
    }

    async fn load(&self, order_id: OrderId) -> Result<Order> {
        self.orders
            .get(order_id)
            .await?
            .ok_or(SagaError::OrderNotFound(order_id))
    }

    async fn lookup_party(&self, role: &'static str, user_id: &UserId) -> Result<Party> {
        self.identity
            .get_user(user_id)
            .await?
            .ok_or_else(|| SagaError::PartyNotFound {
                role,
                user_id: user_id.to_string(),
            })
    }

    /// Releases every reservation made so far. Best-effort; the original
    /// failure is still what the caller sees.
    async fn compensate(&self, reserved: &[(ProductId, Quantity)]) {
        if !reserved.is_empty() {
            warn!(count = reserved.len(), "compensating partial reservations");
            self.stock.release_all(reserved).await;
        }
    }

    async fn request_delivery(&self, order: &Order) -> Option<String> {
        let request = DeliveryRequest {
            order_id: order.id(),
            buyer_id: order.buyer_id().clone(),
            farmer_id: order.farmer_id().clone(),
            pickup_latitude: order.farmer_latitude(),
            pickup_longitude: order.farmer_longitude(),
            dropoff_address: order.delivery().address.clone(),
            dropoff_latitude: order.delivery().latitude,
            dropoff_longitude: order.delivery().longitude,
            amount: order.total(),
        };
        let assigned = self.logistics.request_delivery(request).await;
        if assigned.is_none() {
            warn!(order_number = order.order_number(), "delivery request failed");
        }
        assigned
    }

    async fn fan_out_created(&self, order: &Order, buyer: &Party, farmer: &Party) {
        let data = json!({
            "order_number": order.order_number(),
            "total": order.total().to_string(),
            "buyer_name": buyer.name,
            "farmer_name": farmer.name,
        });
        self.notify(order.buyer_id(), "order_created", data.clone()).await;
        self.notify(order.farmer_id(), "new_order_received", data).await;
    }

    async fn fan_out_paid(&self, order: &Order, transaction: &Transaction) {
        let data = json!({
            "order_number": order.order_number(),
            "amount": transaction.amount().to_string(),
            "reference": transaction.reference(),
        });
        self.notify(order.buyer_id(), "payment_received", data.clone()).await;
        self.notify(order.farmer_id(), "order_paid", data).await;
    }

    async fn notify(&self, recipient: &UserId, template: &'static str, data: Value) {
        let accepted = self
            .notifications
            .send(Notification {
                recipient: recipient.clone(),
                template,
                data,
            })
            .await;
        if !accepted {
            warn!(%recipient, template, "notification fan-out failed");
        }
    }
}
