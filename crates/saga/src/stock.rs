//! Stock reservation and compensation against the catalog collaborator.

use std::sync::Arc;

use common::{ProductId, Quantity};
use tracing::warn;

use crate::collaborators::CatalogService;

/// Thin coordinator over the catalog's stock operations.
///
/// Reserve and release report `false` instead of raising; retry and
/// compensation policy belongs to the saga, not here.
#[derive(Clone)]
pub struct StockCoordinator {
    catalog: Arc<dyn CatalogService>,
}

impl StockCoordinator {
    /// Creates a coordinator over a catalog service.
    pub fn new(catalog: Arc<dyn CatalogService>) -> Self {
        Self { catalog }
    }

    /// Reserves stock for a product. `false` means the reservation could
    /// not be confirmed.
    pub async fn reserve(&self, product_id: &ProductId, quantity: Quantity) -> bool {
        self.catalog.reserve_stock(product_id, quantity).await
    }

    /// Releases previously reserved stock. `false` means the release could
    /// not be confirmed.
    pub async fn release(&self, product_id: &ProductId, quantity: Quantity) -> bool {
        self.catalog.release_stock(product_id, quantity).await
    }

    /// Releases every reservation in the list, best-effort. Failures are
    /// logged and never escalate; a failed release leaks the reservation
    /// until the catalog reconciles it.
    pub async fn release_all(&self, reservations: &[(ProductId, Quantity)]) {
        for (product_id, quantity) in reservations {
            if !self.release(product_id, *quantity).await {
                warn!(%product_id, %quantity, "stock release failed during compensation");
                metrics::counter!("stock_release_failures_total").increment(1);
            }
        }
    }
}
