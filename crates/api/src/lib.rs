//! HTTP API server for the terra-orders saga service.
//!
//! Exposes the saga's order workflows over REST, with structured
//! logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use eventbus::{EventPublisher, InMemoryBroker};
use metrics_exporter_prometheus::PrometheusHandle;
use saga::collaborators::{
    InMemoryCatalogService, InMemoryIdentityService, InMemoryLogisticsService,
    InMemoryNotificationService,
};
use saga::{ExpirySweeper, OrderSaga, SimulatedPaymentProcessor};
use store::{InMemoryOrderStore, InMemoryTransactionStore};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders", post(routes::orders::create))
        .route("/orders", get(routes::orders::list))
        .route("/orders/{id}", get(routes::orders::get))
        .route("/orders/{id}/confirm", post(routes::orders::confirm))
        .route("/orders/{id}/payment", post(routes::orders::payment))
        .route("/orders/{id}/cancel", post(routes::orders::cancel))
        .route("/orders/{id}/complete", post(routes::orders::complete))
        .route(
            "/orders/{id}/delivery-status",
            post(routes::orders::delivery_status),
        )
        .route(
            "/orders/{id}/transactions",
            get(routes::orders::transactions),
        )
        .route("/transactions", get(routes::orders::user_transactions))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// In-memory collaborators behind a default state, kept so the binary
/// (and tests) can seed users, products, and inspect publications.
pub struct Collaborators {
    pub identity: InMemoryIdentityService,
    pub catalog: InMemoryCatalogService,
    pub logistics: InMemoryLogisticsService,
    pub notifications: InMemoryNotificationService,
    pub broker: InMemoryBroker,
    pub publisher: EventPublisher,
    pub orders: InMemoryOrderStore,
    pub transactions: InMemoryTransactionStore,
}

/// Creates application state wired to in-memory stores and collaborator
/// fakes. Real deployments substitute HTTP-backed implementations of the
/// same traits.
pub fn create_default_state(config: &Config) -> (Arc<AppState>, Arc<ExpirySweeper>, Collaborators) {
    let orders = InMemoryOrderStore::new();
    let transactions = InMemoryTransactionStore::new();
    let identity = InMemoryIdentityService::new();
    let catalog = InMemoryCatalogService::new();
    let logistics = InMemoryLogisticsService::new();
    let notifications = InMemoryNotificationService::new();
    let broker = InMemoryBroker::new();

    let publisher = EventPublisher::new(Arc::new(broker.clone()), config.retry());
    let saga = Arc::new(OrderSaga::new(
        Arc::new(orders.clone()),
        Arc::new(transactions.clone()),
        Arc::new(identity.clone()),
        Arc::new(catalog.clone()),
        Arc::new(logistics.clone()),
        Arc::new(notifications.clone()),
        Arc::new(SimulatedPaymentProcessor::new(config.payment_success_rate)),
        publisher.clone(),
        config.pricing(),
    ));

    let sweeper = Arc::new(ExpirySweeper::new(
        Arc::new(orders.clone()),
        Arc::clone(&saga),
    ));
    let state = Arc::new(AppState { saga });

    (
        state,
        sweeper,
        Collaborators {
            identity,
            catalog,
            logistics,
            notifications,
            broker,
            publisher,
            orders,
            transactions,
        },
    )
}
