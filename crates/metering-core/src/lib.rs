//! # Metering Core
//!
//! The two synchronous request-path services of the metering system:
//!
//! - [`ReadingService`]: validates and persists meter readings,
//!   enforcing per-device monotonicity in time and value.
//! - [`BillingService`]: computes consumption and charge for a
//!   contract period and persists the invoice, idempotently even
//!   under concurrent duplicate requests.
//!
//! Both run per inbound request against a [`metering_store::MeteringStore`]
//! and hold no shared mutable state of their own.

pub mod billing;
pub mod config;
pub mod readings;

pub use billing::BillingService;
pub use config::BillingConfig;
pub use readings::ReadingService;
