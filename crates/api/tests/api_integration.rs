//! HTTP-level tests over the full router with in-memory collaborators.

use std::sync::Arc;

use api::config::Config;
use api::Collaborators;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use common::{Money, ProductId, Quantity};
use metrics_exporter_prometheus::PrometheusBuilder;
use saga::collaborators::ProductSnapshot;
use serde_json::{json, Value};
use tower::ServiceExt;

fn test_app() -> (Router, Collaborators) {
    let config = Config {
        // Deterministic payments for HTTP tests.
        payment_success_rate: 1.0,
        ..Config::default()
    };
    let (state, _sweeper, collaborators) = api::create_default_state(&config);

    collaborators.identity.add_simple_user("buyer-1", "Amina");
    collaborators.identity.add_simple_user("farmer-1", "Ba");
    collaborators.catalog.add_product(
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

    let handle = PrometheusBuilder::new().build_recorder().handle();
    (api::create_app(state, handle), collaborators)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn create_body() -> Value {
    json!({
        "buyer_id": "buyer-1",
        "farmer_id": "farmer-1",
        "items": [{"product_id": "PRD-001", "quantity": 250}],
        "delivery": {"address": "Quartier Bastos, Yaounde", "latitude": null, "longitude": null}
    })
}

async fn create_order(app: &Router) -> Value {
    let response = app
        .clone()
        .oneshot(post_json("/orders", create_body()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

#[tokio::test]
async fn test_health() {
    let (app, _) = test_app();
    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_create_order_returns_snapshot() {
    let (app, _) = test_app();
    let order = create_order(&app).await;

    // 2.5 kg x 400.00, base fee 500.00
    assert_eq!(order["subtotal"], "1000.00");
    assert_eq!(order["delivery_fee"], "500.00");
    assert_eq!(order["total"], "1500.00");
    assert_eq!(order["status"], "PENDING");
    assert!(order["order_number"].as_str().unwrap().starts_with("TRB"));
}

#[tokio::test]
async fn test_create_order_with_unknown_buyer_is_bad_request() {
    let (app, _) = test_app();
    let mut body = create_body();
    body["buyer_id"] = json!("nobody");

    let response = app.oneshot(post_json("/orders", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "PARTY_NOT_FOUND");
}

#[tokio::test]
async fn test_payment_flow_over_http() {
    let (app, _) = test_app();
    let order = create_order(&app).await;
    let id = order["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(post_json(&format!("/orders/{id}/confirm"), json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/orders/{id}/payment"),
            json!({"payment_method": "MTN_MOMO"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["order"]["status"], "PAID");
    assert_eq!(body["transaction"]["status"], "SUCCESS");
    assert_eq!(body["transaction"]["attempt_count"], 1);

    let response = app
        .oneshot(get(&format!("/orders/{id}/transactions")))
        .await
        .unwrap();
    let transactions = body_json(response).await;
    assert_eq!(transactions.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_payment_before_confirmation_conflicts() {
    let (app, _) = test_app();
    let order = create_order(&app).await;
    let id = order["id"].as_str().unwrap();

    let response = app
        .oneshot(post_json(
            &format!("/orders/{id}/payment"),
            json!({"payment_method": "CASH"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "INVALID_STATE");
}

#[tokio::test]
async fn test_cancel_over_http_releases_stock() {
    let (app, collaborators) = test_app();
    let order = create_order(&app).await;
    let id = order["id"].as_str().unwrap();

    let response = app
        .oneshot(post_json(
            &format!("/orders/{id}/cancel"),
            json!({"reason": "Changed my mind"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "CANCELLED");
    assert_eq!(body["cancellation_reason"], "Changed my mind");

    assert_eq!(
        collaborators.catalog.stock_level(&ProductId::new("PRD-001")),
        Some(Quantity::from_whole(100))
    );
}

#[tokio::test]
async fn test_unknown_order_is_not_found() {
    let (app, _) = test_app();
    let response = app
        .oneshot(get(&format!("/orders/{}", uuid::Uuid::new_v4())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "ORDER_NOT_FOUND");
}

#[tokio::test]
async fn test_malformed_order_id_is_bad_request() {
    let (app, _) = test_app();
    let response = app.oneshot(get("/orders/not-a-uuid")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_listing_requires_exactly_one_party() {
    let (app, _) = test_app();
    create_order(&app).await;

    let response = app
        .clone()
        .oneshot(get("/orders?buyer_id=buyer-1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let response = app.oneshot(get("/orders")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delivery_webhook_drives_status() {
    let (app, _) = test_app();
    let order = create_order(&app).await;
    let id = order["id"].as_str().unwrap();

    app.clone()
        .oneshot(post_json(&format!("/orders/{id}/confirm"), json!({})))
        .await
        .unwrap();
    app.clone()
        .oneshot(post_json(
            &format!("/orders/{id}/payment"),
            json!({"payment_method": "ORANGE_MONEY"}),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/orders/{id}/delivery-status"),
            json!({"event": "PICKED_UP", "delivery_id": "DLV-EXT-1"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "IN_DELIVERY");
    assert_eq!(body["delivery_id"], "DLV-EXT-1");

    app.clone()
        .oneshot(post_json(
            &format!("/orders/{id}/delivery-status"),
            json!({"event": "DELIVERED"}),
        ))
        .await
        .unwrap();

    let response = app
        .oneshot(post_json(&format!("/orders/{id}/complete"), json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["order"]["status"], "COMPLETED");
    assert_eq!(body["transaction"]["transaction_type"], "PAYOUT");
}

#[tokio::test]
async fn test_user_transactions_lists_payer_and_payee_sides() {
    let (app, _) = test_app();
    let order = create_order(&app).await;
    let id = order["id"].as_str().unwrap();

    app.clone()
        .oneshot(post_json(&format!("/orders/{id}/confirm"), json!({})))
        .await
        .unwrap();
    app.clone()
        .oneshot(post_json(
            &format!("/orders/{id}/payment"),
            json!({"payment_method": "MTN_MOMO"}),
        ))
        .await
        .unwrap();

    // The buyer pays, the farmer is paid; both sides see the transaction.
    for user in ["buyer-1", "farmer-1"] {
        let response = app
            .clone()
            .oneshot(get(&format!("/transactions?user_id={user}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["transaction_type"], "PAYMENT");
    }

    let response = app
        .clone()
        .oneshot(get("/transactions?user_id=nobody"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body.as_array().unwrap().is_empty());

    let response = app.oneshot(get("/transactions")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_metrics_endpoint_renders() {
    let (app, _) = test_app();
    let response = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
