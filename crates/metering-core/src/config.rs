//! Billing configuration
//!
//! Loaded once at startup and passed into [`crate::BillingService`]
//! by value; components never read ambient globals.

use rust_decimal::RoundingStrategy;

/// Rounding configuration for invoice amounts
#[derive(Debug, Clone, Copy)]
pub struct BillingConfig {
    /// Decimal places for the invoice amount
    pub scale: u32,
    /// Rounding mode applied to the amount
    pub rounding: RoundingStrategy,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            scale: 2,
            rounding: RoundingStrategy::MidpointAwayFromZero,
        }
    }
}

impl BillingConfig {
    /// Load configuration from environment variables.
    ///
    /// `BILLING_SCALE`: decimal places (default 2).
    /// `BILLING_ROUNDING`: one of `half-up`, `half-even`, `down`, `up`
    /// (default `half-up`).
    pub fn load() -> Self {
        let mut cfg = Self::default();

        if let Ok(val) = std::env::var("BILLING_SCALE") {
            if let Ok(v) = val.parse() {
                cfg.scale = v;
            }
        }
        if let Ok(val) = std::env::var("BILLING_ROUNDING") {
            if let Some(strategy) = parse_rounding(&val) {
                cfg.rounding = strategy;
            }
        }

        cfg
    }
}

fn parse_rounding(name: &str) -> Option<RoundingStrategy> {
    match name.to_ascii_lowercase().as_str() {
        "half-up" => Some(RoundingStrategy::MidpointAwayFromZero),
        "half-even" => Some(RoundingStrategy::MidpointNearestEven),
        "down" => Some(RoundingStrategy::ToZero),
        "up" => Some(RoundingStrategy::AwayFromZero),
        _ => None,
    }
}
