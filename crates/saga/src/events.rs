//! Routing keys and event payloads published by the saga.

use domain::{Order, Transaction};
use serde_json::{json, Value};

/// Routing key for new orders.
pub const ORDER_CREATED: &str = "order.created";

/// Routing key for successful payments.
pub const ORDER_PAID: &str = "order.paid";

/// Routing key for cancellations.
pub const ORDER_CANCELLED: &str = "order.cancelled";

/// Routing key for completed orders.
pub const ORDER_COMPLETED: &str = "order.completed";

/// Routing key for delivery-driven status changes.
pub const ORDER_STATUS_UPDATED: &str = "order.status.updated";

/// Full order snapshot published on creation.
pub fn order_created(order: &Order) -> Value {
    json!({
        "order_id": order.id(),
        "order_number": order.order_number(),
        "buyer_id": order.buyer_id(),
        "farmer_id": order.farmer_id(),
        "status": order.status().as_str(),
        "subtotal": order.subtotal().to_string(),
        "delivery_fee": order.delivery_fee().to_string(),
        "platform_commission": order.platform_commission().map(|m| m.to_string()),
        "total": order.total().to_string(),
        "delivery_address": order.delivery().address,
        "items": order.items().iter().map(|item| json!({
            "product_id": item.product_id,
            "product_name": item.product_name,
            "quantity": item.quantity.to_string(),
            "unit": item.unit,
            "unit_price": item.unit_price.to_string(),
            "total_price": item.total_price.to_string(),
        })).collect::<Vec<_>>(),
        "created_at": order.created_at(),
    })
}

/// Payment confirmation payload.
pub fn order_paid(order: &Order, transaction: &Transaction) -> Value {
    json!({
        "order_id": order.id(),
        "order_number": order.order_number(),
        "buyer_id": order.buyer_id(),
        "farmer_id": order.farmer_id(),
        "amount": transaction.amount().to_string(),
        "payment_method": transaction.payment_method(),
        "transaction_reference": transaction.reference(),
        "paid_at": order.paid_at(),
    })
}

/// Cancellation payload. `requires_refund` tells the payment service
/// whether money already moved for this order.
pub fn order_cancelled(order: &Order) -> Value {
    json!({
        "order_id": order.id(),
        "order_number": order.order_number(),
        "buyer_id": order.buyer_id(),
        "farmer_id": order.farmer_id(),
        "reason": order.cancellation_reason(),
        "requires_refund": order.paid_at().is_some(),
        "total": order.total().to_string(),
        "cancelled_at": order.cancelled_at(),
    })
}

/// Completion payload, published when the farmer payout is initiated.
pub fn order_completed(order: &Order) -> Value {
    json!({
        "order_id": order.id(),
        "order_number": order.order_number(),
        "buyer_id": order.buyer_id(),
        "farmer_id": order.farmer_id(),
        "total": order.total().to_string(),
        "platform_commission": order.platform_commission().map(|m| m.to_string()),
        "completed_at": order.completed_at(),
    })
}

/// Status-change payload for delivery-driven transitions.
pub fn order_status_updated(order: &Order) -> Value {
    json!({
        "order_id": order.id(),
        "order_number": order.order_number(),
        "status": order.status().as_str(),
        "delivery_id": order.delivery_id(),
        "updated_at": chrono::Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use common::{Money, Quantity, UserId};
    use domain::{DeliveryInfo, NewOrder, OrderItem, PricingPolicy};

    fn sample_order() -> Order {
        Order::create(
            NewOrder {
                buyer_id: UserId::new("buyer-1"),
                farmer_id: UserId::new("farmer-1"),
                delivery: DeliveryInfo {
                    address: "Quartier Bastos, Yaounde".to_string(),
                    latitude: None,
                    longitude: None,
                },
                farmer_latitude: None,
                farmer_longitude: None,
                buyer_notes: None,
            },
            vec![OrderItem::new(
                "PRD-001",
                "Tomatoes",
                "Vegetables",
                Quantity::from_hundredths(250),
                "kg",
                Money::from_major(400),
            )],
            &PricingPolicy::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_created_payload_carries_full_snapshot() {
        let order = sample_order();
        let payload = order_created(&order);

        assert_eq!(payload["order_number"], order.order_number());
        assert_eq!(payload["status"], "PENDING");
        assert_eq!(payload["subtotal"], "1000.00");
        assert_eq!(payload["total"], "1500.00");
        assert_eq!(payload["items"].as_array().unwrap().len(), 1);
        assert_eq!(payload["items"][0]["quantity"], "2.50");
    }

    #[test]
    fn test_cancelled_payload_requires_refund_follows_paid_at() {
        let mut order = sample_order();
        order.cancel("Buyer changed their mind").unwrap();
        let payload = order_cancelled(&order);
        assert_eq!(payload["requires_refund"], false);

        let mut paid = sample_order();
        paid.confirm().unwrap();
        paid.mark_paid(Utc::now()).unwrap();
        paid.cancel("Farmer out of stock").unwrap();
        let payload = order_cancelled(&paid);
        assert_eq!(payload["requires_refund"], true);
    }
}
