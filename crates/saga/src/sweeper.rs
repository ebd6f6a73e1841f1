//! Periodic cancellation of stale unpaid orders.

use std::sync::Arc;

use chrono::{Duration, Utc};
use domain::OrderStatus;
use store::OrderStore;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::coordinator::OrderSaga;
use crate::error::Result;

/// Reason stamped on orders cancelled by the sweeper.
pub const EXPIRY_REASON: &str = "Order expired: payment not received in time";

/// Outcome of one sweep run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Stale orders examined.
    pub examined: usize,
    /// Orders cancelled this run.
    pub cancelled: usize,
    /// Orders whose cancellation failed.
    pub failed: usize,
    /// True when the run was skipped because another was in flight.
    pub skipped: bool,
}

/// Force-cancels PENDING orders older than a maximum age, through the
/// same cancellation path as an explicit cancel.
///
/// Runs are single-flight: a sweep that overlaps a running one is
/// skipped, not queued. A failing order is logged and does not abort
/// the rest of the batch.
pub struct ExpirySweeper {
    orders: Arc<dyn OrderStore>,
    saga: Arc<OrderSaga>,
    running: Mutex<()>,
}

impl ExpirySweeper {
    /// Creates a sweeper over the order store and the saga.
    pub fn new(orders: Arc<dyn OrderStore>, saga: Arc<OrderSaga>) -> Self {
        Self {
            orders,
            saga,
            running: Mutex::new(()),
        }
    }

    /// Sweeps once, cancelling every PENDING order created more than
    /// `max_age` ago.
    #[tracing::instrument(skip(self))]
    pub async fn sweep(&self, max_age: Duration) -> Result<SweepReport> {
        let Ok(_guard) = self.running.try_lock() else {
            info!("sweep already in flight, skipping");
            return Ok(SweepReport {
                skipped: true,
                ..SweepReport::default()
            });
        };

        let cutoff = Utc::now() - max_age;
        let stale = self
            .orders
            .find_stale(OrderStatus::Pending, cutoff)
            .await?;

        let mut report = SweepReport {
            examined: stale.len(),
            ..SweepReport::default()
        };
        for order in stale {
            match self.saga.cancel_order(order.id(), EXPIRY_REASON).await {
                Ok(_) => report.cancelled += 1,
                Err(error) => {
                    report.failed += 1;
                    warn!(
                        order_number = order.order_number(),
                        %error,
                        "expiry cancellation failed"
                    );
                }
            }
        }

        metrics::counter!("orders_expired_total").increment(report.cancelled as u64);
        info!(
            examined = report.examined,
            cancelled = report.cancelled,
            failed = report.failed,
            "expiry sweep finished"
        );
        Ok(report)
    }
}
