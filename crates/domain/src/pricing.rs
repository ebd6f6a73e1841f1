//! Pricing policy for derived order amounts.

use common::Money;

/// Commission and delivery fee parameters, resolved once at startup.
///
/// The saga receives this struct fully formed; nothing in the core
/// re-reads configuration mid-workflow.
#[derive(Debug, Clone)]
pub struct PricingPolicy {
    /// Platform commission rate in basis points (1000 = 10%).
    pub commission_rate_bps: u32,
    /// Flat delivery fee applied below the free-delivery threshold.
    pub base_delivery_fee: Money,
    /// Subtotal at or above which delivery is free.
    pub free_delivery_threshold: Money,
}

impl PricingPolicy {
    /// Platform commission derived from the subtotal.
    pub fn commission_on(&self, subtotal: Money) -> Money {
        subtotal.apply_rate_bps(self.commission_rate_bps)
    }

    /// Delivery fee for an order with the given subtotal.
    pub fn delivery_fee_for(&self, subtotal: Money) -> Money {
        if subtotal >= self.free_delivery_threshold {
            Money::zero()
        } else {
            self.base_delivery_fee
        }
    }
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            commission_rate_bps: 1000,
            base_delivery_fee: Money::from_major(500),
            free_delivery_threshold: Money::from_major(10_000),
        }
    }
}
