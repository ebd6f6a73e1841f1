//! End-to-end saga tests over the in-memory collaborators.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use common::{Money, ProductId, Quantity, UserId};
use domain::{DeliveryInfo, OrderStatus, PaymentMethod, PricingPolicy, TransactionStatus, TransactionType};
use eventbus::{EventPublisher, InMemoryBroker, RetryPolicy};
use saga::collaborators::{
    InMemoryCatalogService, InMemoryIdentityService, InMemoryLogisticsService,
    InMemoryNotificationService, ProductSnapshot,
};
use saga::{
    CreateOrderRequest, DeliveryEvent, DeliveryStatusUpdate, ExpirySweeper, OrderItemRequest,
    OrderSaga, PaymentRequest, SagaError, SimulatedPaymentProcessor, EXPIRY_REASON,
};
use store::{InMemoryOrderStore, InMemoryTransactionStore, OrderStore};

struct Harness {
    saga: Arc<OrderSaga>,
    orders: InMemoryOrderStore,
    transactions: InMemoryTransactionStore,
    identity: InMemoryIdentityService,
    catalog: InMemoryCatalogService,
    logistics: InMemoryLogisticsService,
    notifications: InMemoryNotificationService,
    broker: InMemoryBroker,
}

fn setup(processor: SimulatedPaymentProcessor) -> Harness {
    let orders = InMemoryOrderStore::new();
    let transactions = InMemoryTransactionStore::new();
    let identity = InMemoryIdentityService::new();
    let catalog = InMemoryCatalogService::new();
    let logistics = InMemoryLogisticsService::new();
    let notifications = InMemoryNotificationService::new();
    let broker = InMemoryBroker::new();

    identity.add_simple_user("buyer-1", "Amina");
    identity.add_simple_user("farmer-1", "Ba");
    catalog.add_product(
        ProductSnapshot {
            id: ProductId::new("PRD-001"),
            name: "Tomatoes".to_string(),
            category: "Vegetables".to_string(),
            unit: "kg".to_string(),
            unit_price: Money::from_major(400),
            image_url: None,
        },
        Quantity::from_whole(100),
    );
    catalog.add_product(
        ProductSnapshot {
            id: ProductId::new("PRD-002"),
            name: "Plantains".to_string(),
            category: "Fruits".to_string(),
            unit: "kg".to_string(),
            unit_price: Money::from_major(300),
            image_url: None,
        },
        Quantity::from_whole(100),
    );

    let publisher = EventPublisher::new(
        Arc::new(broker.clone()),
        RetryPolicy {
            max_attempts: 3,
            base_delay: StdDuration::from_millis(1),
            max_delay: StdDuration::from_millis(4),
        },
    );
    let saga = Arc::new(OrderSaga::new(
        Arc::new(orders.clone()),
        Arc::new(transactions.clone()),
        Arc::new(identity.clone()),
        Arc::new(catalog.clone()),
        Arc::new(logistics.clone()),
        Arc::new(notifications.clone()),
        Arc::new(processor),
        publisher,
        PricingPolicy::default(),
    ));

    Harness {
        saga,
        orders,
        transactions,
        identity,
        catalog,
        logistics,
        notifications,
        broker,
    }
}

fn standard_request() -> CreateOrderRequest {
    CreateOrderRequest {
        buyer_id: UserId::new("buyer-1"),
        farmer_id: UserId::new("farmer-1"),
        items: vec![
            OrderItemRequest {
                product_id: ProductId::new("PRD-001"),
                quantity: Quantity::from_hundredths(250),
            },
            OrderItemRequest {
                product_id: ProductId::new("PRD-002"),
                quantity: Quantity::from_whole(1),
            },
        ],
        delivery: DeliveryInfo {
            address: "Quartier Bastos, Yaounde".to_string(),
            latitude: Some(3.8869),
            longitude: Some(11.5167),
        },
        buyer_notes: None,
    }
}

/// Lets spawned fan-out tasks run to completion on the test runtime.
async fn drain_tasks() {
    for _ in 0..4 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn test_create_order_happy_path() {
    let h = setup(SimulatedPaymentProcessor::always_succeeds());

    let order = h.saga.create_order(standard_request()).await.unwrap();

    // 2.5 x 400.00 + 1.0 x 300.00, base fee 500 below the 10000 threshold
    assert_eq!(order.subtotal(), Money::from_major(1300));
    assert_eq!(order.delivery_fee(), Money::from_major(500));
    assert_eq!(order.total(), Money::from_major(1800));
    let item_sum: Money = order.items().iter().map(|i| i.total_price).sum();
    assert_eq!(item_sum, order.subtotal());
    assert_eq!(order.status(), OrderStatus::Pending);

    // Stock reserved for both lines.
    assert_eq!(
        h.catalog.stock_level(&ProductId::new("PRD-001")),
        Some(Quantity::from_hundredths(9750))
    );
    assert_eq!(
        h.catalog.stock_level(&ProductId::new("PRD-002")),
        Some(Quantity::from_whole(99))
    );

    // Snapshot published, both parties notified once fan-out has run.
    assert_eq!(h.broker.published_for("order.created").await.len(), 1);
    drain_tasks().await;
    assert_eq!(h.notifications.sent_to(&UserId::new("buyer-1")).len(), 1);
    assert_eq!(h.notifications.sent_to(&UserId::new("farmer-1")).len(), 1);
    assert_eq!(h.orders.order_count().await, 1);
}

#[tokio::test]
async fn test_create_order_fan_out_is_detached() {
    let h = setup(SimulatedPaymentProcessor::always_succeeds());
    h.notifications.set_fail_on_send(true);

    // Dead notification channel never blocks or fails order creation.
    let order = h.saga.create_order(standard_request()).await.unwrap();
    assert_eq!(order.status(), OrderStatus::Pending);
    assert_eq!(h.orders.order_count().await, 1);

    drain_tasks().await;
    assert_eq!(h.notifications.sent_count(), 0);
}

#[tokio::test]
async fn test_failed_reservation_releases_earlier_items() {
    let h = setup(SimulatedPaymentProcessor::always_succeeds());
    // Second line cannot be satisfied.
    h.catalog.add_product(
        ProductSnapshot {
            id: ProductId::new("PRD-003"),
            name: "Cocoa beans".to_string(),
            category: "Cash crops".to_string(),
            unit: "kg".to_string(),
            unit_price: Money::from_major(2000),
            image_url: None,
        },
        Quantity::from_whole(1),
    );

    let mut request = standard_request();
    request.items = vec![
        OrderItemRequest {
            product_id: ProductId::new("PRD-001"),
            quantity: Quantity::from_whole(2),
        },
        OrderItemRequest {
            product_id: ProductId::new("PRD-003"),
            quantity: Quantity::from_whole(5),
        },
    ];

    let result = h.saga.create_order(request).await;
    assert!(matches!(result, Err(SagaError::InsufficientStock { .. })));

    // The first reservation was compensated and nothing was persisted.
    let releases = h.catalog.release_calls();
    assert_eq!(releases.len(), 1);
    assert_eq!(releases[0].product_id, ProductId::new("PRD-001"));
    assert_eq!(
        h.catalog.stock_level(&ProductId::new("PRD-001")),
        Some(Quantity::from_whole(100))
    );
    assert_eq!(h.orders.order_count().await, 0);
    assert!(h.broker.published_for("order.created").await.is_empty());
}

#[tokio::test]
async fn test_unknown_party_fails_fast() {
    let h = setup(SimulatedPaymentProcessor::always_succeeds());

    let mut request = standard_request();
    request.buyer_id = UserId::new("nobody");
    let result = h.saga.create_order(request).await;

    assert!(matches!(
        result,
        Err(SagaError::PartyNotFound { role: "buyer", .. })
    ));
    assert!(h.catalog.reserve_calls().is_empty());
    assert_eq!(h.orders.order_count().await, 0);
}

#[tokio::test]
async fn test_unknown_product_compensates_prior_lines() {
    let h = setup(SimulatedPaymentProcessor::always_succeeds());

    let mut request = standard_request();
    request.items.push(OrderItemRequest {
        product_id: ProductId::new("PRD-404"),
        quantity: Quantity::from_whole(1),
    });
    let result = h.saga.create_order(request).await;

    assert!(matches!(result, Err(SagaError::ProductNotFound { .. })));
    assert_eq!(h.catalog.release_calls().len(), 2);
    assert_eq!(
        h.catalog.stock_level(&ProductId::new("PRD-001")),
        Some(Quantity::from_whole(100))
    );
    assert_eq!(h.orders.order_count().await, 0);
}

#[tokio::test]
async fn test_payment_requires_confirmed_order() {
    let h = setup(SimulatedPaymentProcessor::always_succeeds());
    let order = h.saga.create_order(standard_request()).await.unwrap();

    let result = h
        .saga
        .process_payment(
            order.id(),
            PaymentRequest {
                payment_method: PaymentMethod::MtnMomo,
            },
        )
        .await;

    assert!(matches!(
        result,
        Err(SagaError::InvalidState {
            expected: "CONFIRMED",
            ..
        })
    ));
    let stored = h.orders.get(order.id()).await.unwrap().unwrap();
    assert_eq!(stored.status(), OrderStatus::Pending);
}

#[tokio::test]
async fn test_successful_payment_moves_order_to_paid() {
    let h = setup(SimulatedPaymentProcessor::always_succeeds());
    let order = h.saga.create_order(standard_request()).await.unwrap();
    h.saga.confirm_order(order.id()).await.unwrap();

    let (paid_order, transaction) = h
        .saga
        .process_payment(
            order.id(),
            PaymentRequest {
                payment_method: PaymentMethod::OrangeMoney,
            },
        )
        .await
        .unwrap();

    assert_eq!(paid_order.status(), OrderStatus::Paid);
    assert!(paid_order.paid_at().is_some());
    assert_eq!(transaction.status(), TransactionStatus::Success);
    assert_eq!(transaction.attempts().len(), 1);
    assert!(transaction.attempts()[0].success);
    assert_eq!(transaction.amount(), paid_order.total());

    // Delivery assignment was requested and recorded.
    assert_eq!(h.logistics.request_count(), 1);
    assert_eq!(paid_order.delivery_id(), Some("DLV-0001"));

    assert_eq!(h.broker.published_for("order.paid").await.len(), 1);
}

#[tokio::test]
async fn test_declined_payment_leaves_order_confirmed() {
    let h = setup(SimulatedPaymentProcessor::always_fails());
    let order = h.saga.create_order(standard_request()).await.unwrap();
    h.saga.confirm_order(order.id()).await.unwrap();

    let result = h
        .saga
        .process_payment(
            order.id(),
            PaymentRequest {
                payment_method: PaymentMethod::Cash,
            },
        )
        .await;
    assert!(matches!(result, Err(SagaError::PaymentFailed { .. })));

    let stored = h.orders.get(order.id()).await.unwrap().unwrap();
    assert_eq!(stored.status(), OrderStatus::Confirmed);
    assert!(stored.paid_at().is_none());

    // The failed transaction is kept for audit with exactly one attempt.
    let transactions = h.saga.transactions_for_order(order.id()).await.unwrap();
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0].status(), TransactionStatus::Failed);
    assert_eq!(transactions[0].attempts().len(), 1);
    assert!(!transactions[0].attempts()[0].success);

    assert!(h.broker.published_for("order.paid").await.is_empty());
    assert_eq!(h.logistics.request_count(), 0);
}

#[tokio::test]
async fn test_cancel_unpaid_order_does_not_require_refund() {
    let h = setup(SimulatedPaymentProcessor::always_succeeds());
    let order = h.saga.create_order(standard_request()).await.unwrap();

    let cancelled = h
        .saga
        .cancel_order(order.id(), "Buyer changed their mind")
        .await
        .unwrap();

    assert_eq!(cancelled.status(), OrderStatus::Cancelled);
    assert_eq!(cancelled.cancellation_reason(), Some("Buyer changed their mind"));

    let published = h.broker.published_for("order.cancelled").await;
    assert_eq!(published.len(), 1);
    let envelope: eventbus::EventEnvelope = serde_json::from_slice(&published[0].body).unwrap();
    assert_eq!(envelope.data["requires_refund"], false);

    // Stock went back.
    assert_eq!(
        h.catalog.stock_level(&ProductId::new("PRD-001")),
        Some(Quantity::from_whole(100))
    );
}

#[tokio::test]
async fn test_cancel_paid_order_requires_refund() {
    let h = setup(SimulatedPaymentProcessor::always_succeeds());
    let order = h.saga.create_order(standard_request()).await.unwrap();
    h.saga.confirm_order(order.id()).await.unwrap();
    h.saga
        .process_payment(
            order.id(),
            PaymentRequest {
                payment_method: PaymentMethod::MtnMomo,
            },
        )
        .await
        .unwrap();

    h.saga
        .cancel_order(order.id(), "Farmer out of stock")
        .await
        .unwrap();

    let published = h.broker.published_for("order.cancelled").await;
    assert_eq!(published.len(), 1);
    let envelope: eventbus::EventEnvelope = serde_json::from_slice(&published[0].body).unwrap();
    assert_eq!(envelope.data["requires_refund"], true);
}

#[tokio::test]
async fn test_cancel_delivered_order_is_rejected_without_mutation() {
    let h = setup(SimulatedPaymentProcessor::always_succeeds());
    let order = h.saga.create_order(standard_request()).await.unwrap();
    h.saga.confirm_order(order.id()).await.unwrap();
    h.saga
        .process_payment(
            order.id(),
            PaymentRequest {
                payment_method: PaymentMethod::MtnMomo,
            },
        )
        .await
        .unwrap();
    h.saga
        .update_delivery_status(
            order.id(),
            DeliveryStatusUpdate {
                event: DeliveryEvent::PickedUp,
                delivery_id: None,
            },
        )
        .await
        .unwrap();
    h.saga
        .update_delivery_status(
            order.id(),
            DeliveryStatusUpdate {
                event: DeliveryEvent::Delivered,
                delivery_id: None,
            },
        )
        .await
        .unwrap();

    let result = h.saga.cancel_order(order.id(), "Too late").await;
    assert!(result.is_err());
    assert_eq!(result.unwrap_err().error_code(), "INVALID_STATE");

    let stored = h.orders.get(order.id()).await.unwrap().unwrap();
    assert_eq!(stored.status(), OrderStatus::Delivered);
    assert!(stored.cancelled_at().is_none());
    assert!(h.broker.published_for("order.cancelled").await.is_empty());
}

#[tokio::test]
async fn test_complete_order_initiates_farmer_payout() {
    let h = setup(SimulatedPaymentProcessor::always_succeeds());
    let order = h.saga.create_order(standard_request()).await.unwrap();
    h.saga.confirm_order(order.id()).await.unwrap();
    h.saga
        .process_payment(
            order.id(),
            PaymentRequest {
                payment_method: PaymentMethod::MobileMoney,
            },
        )
        .await
        .unwrap();
    h.saga
        .update_delivery_status(
            order.id(),
            DeliveryStatusUpdate {
                event: DeliveryEvent::PickedUp,
                delivery_id: Some("DLV-EXT-7".to_string()),
            },
        )
        .await
        .unwrap();
    h.saga
        .update_delivery_status(
            order.id(),
            DeliveryStatusUpdate {
                event: DeliveryEvent::Delivered,
                delivery_id: None,
            },
        )
        .await
        .unwrap();

    let (completed, payout) = h.saga.complete_order(order.id()).await.unwrap();

    assert_eq!(completed.status(), OrderStatus::Completed);
    assert!(completed.completed_at().is_some());
    assert_eq!(completed.delivery_id(), Some("DLV-EXT-7"));
    assert_eq!(payout.transaction_type(), TransactionType::Payout);
    assert_eq!(payout.status(), TransactionStatus::Pending);
    assert_eq!(
        payout.amount(),
        completed.total() - completed.platform_commission().unwrap()
    );
    assert_eq!(h.broker.published_for("order.completed").await.len(), 1);

    // Payment and payout are both on the order's ledger.
    assert_eq!(h.transactions.transaction_count().await, 2);
}

#[tokio::test]
async fn test_complete_requires_delivered() {
    let h = setup(SimulatedPaymentProcessor::always_succeeds());
    let order = h.saga.create_order(standard_request()).await.unwrap();

    let result = h.saga.complete_order(order.id()).await;
    assert!(result.is_err());
    assert_eq!(result.unwrap_err().error_code(), "INVALID_STATE");
}

#[tokio::test]
async fn test_failed_delivery_cancels_through_shared_path() {
    let h = setup(SimulatedPaymentProcessor::always_succeeds());
    let order = h.saga.create_order(standard_request()).await.unwrap();
    h.saga.confirm_order(order.id()).await.unwrap();
    h.saga
        .process_payment(
            order.id(),
            PaymentRequest {
                payment_method: PaymentMethod::MtnMomo,
            },
        )
        .await
        .unwrap();

    let cancelled = h
        .saga
        .update_delivery_status(
            order.id(),
            DeliveryStatusUpdate {
                event: DeliveryEvent::Failed,
                delivery_id: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(cancelled.status(), OrderStatus::Cancelled);
    assert_eq!(cancelled.cancellation_reason(), Some("Delivery failed"));

    // Paid order, so the cancellation event flags a refund.
    let published = h.broker.published_for("order.cancelled").await;
    let envelope: eventbus::EventEnvelope = serde_json::from_slice(&published[0].body).unwrap();
    assert_eq!(envelope.data["requires_refund"], true);
}

#[tokio::test]
async fn test_publish_failure_does_not_fail_the_operation() {
    let h = setup(SimulatedPaymentProcessor::always_succeeds());
    h.broker.fail_next_publishes(10).await;

    let order = h.saga.create_order(standard_request()).await.unwrap();

    // Order exists even though the event was dropped after retries.
    assert_eq!(h.orders.order_count().await, 1);
    assert_eq!(order.status(), OrderStatus::Pending);
    assert!(h.broker.published_for("order.created").await.is_empty());
}

#[tokio::test]
async fn test_sweeper_cancels_each_stale_order_exactly_once() {
    let h = setup(SimulatedPaymentProcessor::always_succeeds());
    let first = h.saga.create_order(standard_request()).await.unwrap();
    let second = h.saga.create_order(standard_request()).await.unwrap();

    let sweeper = ExpirySweeper::new(Arc::new(h.orders.clone()), Arc::clone(&h.saga));

    // Zero max age makes every pending order stale.
    let report = sweeper.sweep(Duration::zero()).await.unwrap();
    assert_eq!(report.examined, 2);
    assert_eq!(report.cancelled, 2);
    assert_eq!(report.failed, 0);
    assert!(!report.skipped);

    for id in [first.id(), second.id()] {
        let stored = h.orders.get(id).await.unwrap().unwrap();
        assert_eq!(stored.status(), OrderStatus::Cancelled);
        assert_eq!(stored.cancellation_reason(), Some(EXPIRY_REASON));
    }

    // A second run finds nothing to cancel.
    let report = sweeper.sweep(Duration::zero()).await.unwrap();
    assert_eq!(report.examined, 0);
    assert_eq!(report.cancelled, 0);
    assert_eq!(h.broker.published_for("order.cancelled").await.len(), 2);
}

#[tokio::test]
async fn test_sweeper_skips_paid_and_confirmed_orders() {
    let h = setup(SimulatedPaymentProcessor::always_succeeds());
    let pending = h.saga.create_order(standard_request()).await.unwrap();
    let confirmed = h.saga.create_order(standard_request()).await.unwrap();
    h.saga.confirm_order(confirmed.id()).await.unwrap();

    let sweeper = ExpirySweeper::new(Arc::new(h.orders.clone()), Arc::clone(&h.saga));
    let report = sweeper.sweep(Duration::zero()).await.unwrap();

    assert_eq!(report.cancelled, 1);
    let stored = h.orders.get(pending.id()).await.unwrap().unwrap();
    assert_eq!(stored.status(), OrderStatus::Cancelled);
    let stored = h.orders.get(confirmed.id()).await.unwrap().unwrap();
    assert_eq!(stored.status(), OrderStatus::Confirmed);
}

#[tokio::test]
async fn test_identity_outage_surfaces_downstream_unavailable() {
    let h = setup(SimulatedPaymentProcessor::always_succeeds());
    h.identity.set_unavailable(true);

    let result = h.saga.create_order(standard_request()).await;
    assert!(matches!(
        result,
        Err(SagaError::DownstreamUnavailable { service: "identity", .. })
    ));
    assert_eq!(h.orders.order_count().await, 0);
}
