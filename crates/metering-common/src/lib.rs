//! # Metering Common
//!
//! Shared domain types and errors for the metering system.
//!
//! ## Core Types
//!
//! - [`Device`]: a meter with a unique serial number and last-contact timestamp
//! - [`Reading`]: a timestamped counter value reported by a device
//! - [`Contract`]: customer/device binding with an attached [`Tariff`]
//! - [`Invoice`]: consumption and charge for a billing period
//!
//! ## Errors
//!
//! - [`MeteringError`]: validation and data errors surfaced to callers
//! - [`StoreError`]: storage-level failures, including uniqueness conflicts

pub mod error;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{MeteringError, Result, StoreError};
pub use types::{
    contract::{Contract, Tariff},
    device::{Device, DeviceStatus},
    invoice::{Invoice, InvoiceStatus},
    reading::{NewReading, Reading},
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Decimal scale used for meter readings and consumption values
pub const CONSUMPTION_SCALE: u32 = 6;
