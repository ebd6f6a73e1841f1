//! External collaborator traits and in-memory implementations.

pub mod catalog;
pub mod identity;
pub mod logistics;
pub mod notification;

pub use catalog::{CatalogService, InMemoryCatalogService, ProductSnapshot, StockCall};
pub use identity::{IdentityService, InMemoryIdentityService, Party};
pub use logistics::{DeliveryRequest, InMemoryLogisticsService, LogisticsService};
pub use notification::{InMemoryNotificationService, Notification, NotificationService};
