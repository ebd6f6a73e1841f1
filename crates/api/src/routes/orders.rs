//! Order workflow endpoints.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use common::{OrderId, UserId};
use domain::{Order, Transaction};
use saga::{CreateOrderRequest, DeliveryStatusUpdate, OrderSaga, PaymentRequest};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub saga: Arc<OrderSaga>,
}

// -- Request types --

#[derive(Deserialize)]
pub struct CancelRequest {
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub buyer_id: Option<String>,
    pub farmer_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TransactionListParams {
    pub user_id: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub product_id: String,
    pub product_name: String,
    pub product_category: String,
    pub quantity: String,
    pub unit: String,
    pub unit_price: String,
    pub total_price: String,
}

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub order_number: String,
    pub buyer_id: String,
    pub farmer_id: String,
    pub status: String,
    pub subtotal: String,
    pub delivery_fee: String,
    pub platform_commission: Option<String>,
    pub total: String,
    pub delivery_address: String,
    pub delivery_id: Option<String>,
    pub cancellation_reason: Option<String>,
    pub items: Vec<OrderItemResponse>,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id().to_string(),
            order_number: order.order_number().to_string(),
            buyer_id: order.buyer_id().to_string(),
            farmer_id: order.farmer_id().to_string(),
            status: order.status().as_str().to_string(),
            subtotal: order.subtotal().to_string(),
            delivery_fee: order.delivery_fee().to_string(),
            platform_commission: order.platform_commission().map(|m| m.to_string()),
            total: order.total().to_string(),
            delivery_address: order.delivery().address.clone(),
            delivery_id: order.delivery_id().map(String::from),
            cancellation_reason: order.cancellation_reason().map(String::from),
            items: order
                .items()
                .iter()
                .map(|item| OrderItemResponse {
                    product_id: item.product_id.to_string(),
                    product_name: item.product_name.clone(),
                    product_category: item.product_category.clone(),
                    quantity: item.quantity.to_string(),
                    unit: item.unit.clone(),
                    unit_price: item.unit_price.to_string(),
                    total_price: item.total_price.to_string(),
                })
                .collect(),
            created_at: order.created_at(),
            confirmed_at: order.confirmed_at(),
            paid_at: order.paid_at(),
            delivered_at: order.delivered_at(),
            completed_at: order.completed_at(),
            cancelled_at: order.cancelled_at(),
        }
    }
}

#[derive(Serialize)]
pub struct TransactionResponse {
    pub id: String,
    pub reference: String,
    pub order_id: String,
    pub transaction_type: domain::TransactionType,
    pub payment_method: domain::PaymentMethod,
    pub amount: String,
    pub payer_id: String,
    pub payee_id: String,
    pub status: String,
    pub failure_reason: Option<String>,
    pub attempt_count: usize,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl From<&Transaction> for TransactionResponse {
    fn from(txn: &Transaction) -> Self {
        Self {
            id: txn.id().to_string(),
            reference: txn.reference().to_string(),
            order_id: txn.order_id().to_string(),
            transaction_type: txn.transaction_type(),
            payment_method: txn.payment_method(),
            amount: txn.amount().to_string(),
            payer_id: txn.payer_id().to_string(),
            payee_id: txn.payee_id().to_string(),
            status: txn.status().as_str().to_string(),
            failure_reason: txn.failure_reason().map(String::from),
            attempt_count: txn.attempts().len(),
            created_at: txn.created_at(),
            processed_at: txn.processed_at(),
        }
    }
}

#[derive(Serialize)]
pub struct PaymentResponse {
    pub order: OrderResponse,
    pub transaction: TransactionResponse,
}

// -- Handlers --

/// POST /orders — run the order creation saga.
#[tracing::instrument(skip(state, req))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let order = state.saga.create_order(req).await?;
    Ok((StatusCode::CREATED, Json(OrderResponse::from(&order))))
}

/// GET /orders/{id} — load an order.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state.saga.get_order(order_id).await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// GET /orders?buyer_id=|farmer_id= — list a party's orders.
#[tracing::instrument(skip(state))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = match (params.buyer_id, params.farmer_id) {
        (Some(buyer), None) => state.saga.orders_for_buyer(&UserId::new(buyer)).await?,
        (None, Some(farmer)) => state.saga.orders_for_farmer(&UserId::new(farmer)).await?,
        _ => {
            return Err(ApiError::BadRequest(
                "Exactly one of buyer_id or farmer_id is required".to_string(),
            ));
        }
    };
    Ok(Json(orders.iter().map(OrderResponse::from).collect()))
}

/// POST /orders/{id}/confirm — farmer accepts the order.
#[tracing::instrument(skip(state))]
pub async fn confirm(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state.saga.confirm_order(order_id).await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// POST /orders/{id}/payment — take payment for a confirmed order.
#[tracing::instrument(skip(state, req))]
pub async fn payment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<PaymentRequest>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let (order, transaction) = state.saga.process_payment(order_id, req).await?;
    Ok(Json(PaymentResponse {
        order: OrderResponse::from(&order),
        transaction: TransactionResponse::from(&transaction),
    }))
}

/// POST /orders/{id}/cancel — cancel an order with a reason.
#[tracing::instrument(skip(state, req))]
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<CancelRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state.saga.cancel_order(order_id, &req.reason).await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// POST /orders/{id}/complete — complete a delivered order.
#[tracing::instrument(skip(state))]
pub async fn complete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let (order, payout) = state.saga.complete_order(order_id).await?;
    Ok(Json(PaymentResponse {
        order: OrderResponse::from(&order),
        transaction: TransactionResponse::from(&payout),
    }))
}

/// POST /orders/{id}/delivery-status — apply a logistics status report.
#[tracing::instrument(skip(state, req))]
pub async fn delivery_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<DeliveryStatusUpdate>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state.saga.update_delivery_status(order_id, req).await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// GET /orders/{id}/transactions — list an order's transactions.
#[tracing::instrument(skip(state))]
pub async fn transactions(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<TransactionResponse>>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let transactions = state.saga.transactions_for_order(order_id).await?;
    Ok(Json(
        transactions.iter().map(TransactionResponse::from).collect(),
    ))
}

/// GET /transactions?user_id= — list a user's transactions as payer or payee.
#[tracing::instrument(skip(state))]
pub async fn user_transactions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TransactionListParams>,
) -> Result<Json<Vec<TransactionResponse>>, ApiError> {
    let Some(user_id) = params.user_id else {
        return Err(ApiError::BadRequest("user_id is required".to_string()));
    };
    let transactions = state
        .saga
        .transactions_for_user(&UserId::new(user_id))
        .await?;
    Ok(Json(
        transactions.iter().map(TransactionResponse::from).collect(),
    ))
}

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    uuid::Uuid::parse_str(id)
        .map(OrderId::from_uuid)
        .map_err(|e| ApiError::BadRequest(format!("Invalid order id: {e}")))
}
