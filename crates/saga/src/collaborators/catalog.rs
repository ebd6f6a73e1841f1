//! Catalog service trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{Money, ProductId, Quantity};

use crate::error::SagaError;

/// A product as the catalog service knows it, snapshotted onto order items.
#[derive(Debug, Clone)]
pub struct ProductSnapshot {
    /// The product's identifier.
    pub id: ProductId,
    /// Product name.
    pub name: String,
    /// Product category.
    pub category: String,
    /// Unit of measure (e.g. "kg").
    pub unit: String,
    /// Current price per unit.
    pub unit_price: Money,
    /// Product image, if any.
    pub image_url: Option<String>,
}

/// A recorded reserve or release call, for compensation assertions.
#[derive(Debug, Clone, PartialEq)]
pub struct StockCall {
    /// Product the call was for.
    pub product_id: ProductId,
    /// Quantity reserved or released.
    pub quantity: Quantity,
}

/// Trait for catalog lookups and stock operations.
///
/// Reserve and release return `false` on any transport failure or
/// non-success status and never raise; `false` means "could not
/// confirm", not "definitely failed".
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Looks up a product by ID. `Ok(None)` means it does not exist.
    async fn get_product(&self, product_id: &ProductId)
        -> Result<Option<ProductSnapshot>, SagaError>;

    /// Reserves stock for a product.
    async fn reserve_stock(&self, product_id: &ProductId, quantity: Quantity) -> bool;

    /// Releases previously reserved stock.
    async fn release_stock(&self, product_id: &ProductId, quantity: Quantity) -> bool;
}

#[derive(Debug, Default)]
struct InMemoryCatalogState {
    products: HashMap<ProductId, ProductSnapshot>,
    stock: HashMap<ProductId, Quantity>,
    reserve_calls: Vec<StockCall>,
    release_calls: Vec<StockCall>,
    unavailable: bool,
    fail_on_release: bool,
}

/// In-memory catalog service for testing. Tracks stock levels and records
/// every reserve/release call.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalogService {
    state: Arc<RwLock<InMemoryCatalogState>>,
}

impl InMemoryCatalogService {
    /// Creates a new empty catalog service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a product with an available stock level.
    pub fn add_product(&self, product: ProductSnapshot, stock: Quantity) {
        let mut state = self.state.write().unwrap();
        state.stock.insert(product.id.clone(), stock);
        state.products.insert(product.id.clone(), product);
    }

    /// Makes product lookups fail as if the service were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.write().unwrap().unavailable = unavailable;
    }

    /// Makes release calls report failure.
    pub fn set_fail_on_release(&self, fail: bool) {
        self.state.write().unwrap().fail_on_release = fail;
    }

    /// Returns the current stock level for a product.
    pub fn stock_level(&self, product_id: &ProductId) -> Option<Quantity> {
        self.state.read().unwrap().stock.get(product_id).copied()
    }

    /// Returns every reserve call made, in order.
    pub fn reserve_calls(&self) -> Vec<StockCall> {
        self.state.read().unwrap().reserve_calls.clone()
    }

    /// Returns every release call made, in order.
    pub fn release_calls(&self) -> Vec<StockCall> {
        self.state.read().unwrap().release_calls.clone()
    }
}

#[async_trait]
impl CatalogService for InMemoryCatalogService {
    async fn get_product(
        &self,
        product_id: &ProductId,
    ) -> Result<Option<ProductSnapshot>, SagaError> {
        let state = self.state.read().unwrap();
        if state.unavailable {
            return Err(SagaError::DownstreamUnavailable {
                service: "catalog",
                reason: "connection refused".to_string(),
            });
        }
        Ok(state.products.get(product_id).cloned())
    }

    async fn reserve_stock(&self, product_id: &ProductId, quantity: Quantity) -> bool {
        let mut state = self.state.write().unwrap();
        state.reserve_calls.push(StockCall {
            product_id: product_id.clone(),
            quantity,
        });
        if state.unavailable {
            return false;
        }
        match state.stock.get_mut(product_id) {
            Some(level) if level.hundredths() >= quantity.hundredths() => {
                *level = *level - quantity;
                true
            }
            _ => false,
        }
    }

    async fn release_stock(&self, product_id: &ProductId, quantity: Quantity) -> bool {
        let mut state = self.state.write().unwrap();
        state.release_calls.push(StockCall {
            product_id: product_id.clone(),
            quantity,
        });
        if state.unavailable || state.fail_on_release {
            return false;
        }
        if let Some(level) = state.stock.get_mut(product_id) {
            *level = *level + quantity;
        }
        true
    }
}
