//! Order aggregate: the order entity, its items and the status machine.

mod aggregate;
mod status;

pub use aggregate::{DeliveryInfo, NewOrder, Order, OrderItem};
pub use status::OrderStatus;
