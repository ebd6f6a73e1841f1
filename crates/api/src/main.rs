//! API server entry point.

use std::sync::Arc;

use api::config::Config;
use common::{Money, ProductId, Quantity};
use saga::collaborators::ProductSnapshot;
use tokio::signal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

/// Seeds demo parties and products so the in-memory deployment is usable
/// out of the box.
fn seed_demo_data(collaborators: &api::Collaborators) {
    collaborators.identity.add_simple_user("buyer-1", "Amina Njoya");
    collaborators.identity.add_simple_user("farmer-1", "Emmanuel Ba");

    collaborators.catalog.add_product(
        ProductSnapshot {
            id: ProductId::new("PRD-001"),
            name: "Tomatoes".to_string(),
            category: "Vegetables".to_string(),
            unit: "kg".to_string(),
            unit_price: Money::from_major(400),
            image_url: None,
        },
        Quantity::from_whole(500),
    );
    collaborators.catalog.add_product(
        ProductSnapshot {
            id: ProductId::new("PRD-002"),
            name: "Plantains".to_string(),
            category: "Fruits".to_string(),
            unit: "kg".to_string(),
            unit_price: Money::from_major(300),
            image_url: None,
        },
        Quantity::from_whole(500),
    );
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Wire the saga with in-memory stores and collaborators
    let (state, sweeper, collaborators) = api::create_default_state(&config);
    seed_demo_data(&collaborators);
    collaborators.publisher.ensure_exchange().await;

    // 4. Schedule the expiry sweeper
    let expiry = config.order_expiry();
    let sweep_interval = config.sweep_interval();
    let sweeper_task = Arc::clone(&sweeper);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_interval);
        interval.tick().await;
        loop {
            interval.tick().await;
            if let Err(error) = sweeper_task.sweep(expiry).await {
                tracing::error!(%error, "expiry sweep failed");
            }
        }
    });

    // 5. Build and start the server
    let app = api::create_app(state, metrics_handle);
    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}
