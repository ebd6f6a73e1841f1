//! Application configuration loaded from environment variables.

use std::time::Duration as StdDuration;

use chrono::Duration;
use common::Money;
use domain::PricingPolicy;
use eventbus::RetryPolicy;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `COMMISSION_RATE_BPS` — platform commission in basis points (default: `1000`)
/// - `BASE_DELIVERY_FEE_MINOR` — flat delivery fee in minor units (default: `50000`)
/// - `FREE_DELIVERY_THRESHOLD_MINOR` — subtotal waiving the fee (default: `1000000`)
/// - `PAYMENT_SUCCESS_RATE` — simulated provider success probability (default: `0.9`)
/// - `ORDER_EXPIRY_HOURS` — age at which unpaid orders expire (default: `24`)
/// - `SWEEP_INTERVAL_SECS` — expiry sweep period (default: `3600`)
/// - `PUBLISH_MAX_ATTEMPTS` — event publish retries (default: `3`)
///
/// Resolved once at startup; nothing re-reads the environment after this.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub commission_rate_bps: u32,
    pub base_delivery_fee_minor: i64,
    pub free_delivery_threshold_minor: i64,
    pub payment_success_rate: f64,
    pub order_expiry_hours: i64,
    pub sweep_interval_secs: u64,
    pub publish_max_attempts: u32,
}

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_parsed("PORT", 3000),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            commission_rate_bps: env_parsed("COMMISSION_RATE_BPS", 1000),
            base_delivery_fee_minor: env_parsed("BASE_DELIVERY_FEE_MINOR", 50_000),
            free_delivery_threshold_minor: env_parsed("FREE_DELIVERY_THRESHOLD_MINOR", 1_000_000),
            payment_success_rate: env_parsed("PAYMENT_SUCCESS_RATE", 0.9),
            order_expiry_hours: env_parsed("ORDER_EXPIRY_HOURS", 24),
            sweep_interval_secs: env_parsed("SWEEP_INTERVAL_SECS", 3600),
            publish_max_attempts: env_parsed("PUBLISH_MAX_ATTEMPTS", 3),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Pricing policy handed to the domain.
    pub fn pricing(&self) -> PricingPolicy {
        PricingPolicy {
            commission_rate_bps: self.commission_rate_bps,
            base_delivery_fee: Money::from_minor(self.base_delivery_fee_minor),
            free_delivery_threshold: Money::from_minor(self.free_delivery_threshold_minor),
        }
    }

    /// Retry policy for event publication.
    pub fn retry(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.publish_max_attempts,
            ..RetryPolicy::default()
        }
    }

    /// Age past which unpaid orders are swept.
    pub fn order_expiry(&self) -> Duration {
        Duration::hours(self.order_expiry_hours)
    }

    /// How often the sweeper runs.
    pub fn sweep_interval(&self) -> StdDuration {
        StdDuration::from_secs(self.sweep_interval_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            commission_rate_bps: 1000,
            base_delivery_fee_minor: 50_000,
            free_delivery_threshold_minor: 1_000_000,
            payment_success_rate: 0.9,
            order_expiry_hours: 24,
            sweep_interval_secs: 3600,
            publish_max_attempts: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.addr(), "0.0.0.0:3000");
        assert_eq!(config.order_expiry_hours, 24);
        assert_eq!(config.payment_success_rate, 0.9);
    }

    #[test]
    fn test_pricing_matches_config() {
        let config = Config::default();
        let pricing = config.pricing();
        assert_eq!(pricing.commission_rate_bps, 1000);
        assert_eq!(pricing.base_delivery_fee, Money::from_major(500));
        assert_eq!(pricing.free_delivery_threshold, Money::from_major(10_000));
    }

    #[test]
    fn test_retry_policy_bounds_attempts() {
        let config = Config {
            publish_max_attempts: 5,
            ..Config::default()
        };
        assert_eq!(config.retry().max_attempts, 5);
    }
}
