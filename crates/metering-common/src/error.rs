//! Error types for the metering system
//!
//! All variants here are caused by user input or stored data, not by
//! transient conditions; none of them are retried internally.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

/// Result type alias using MeteringError
pub type Result<T> = std::result::Result<T, MeteringError>;

/// Unified error type for metering operations
#[derive(Debug, Error)]
pub enum MeteringError {
    /// Referenced device does not exist
    #[error("unknown device: {0}")]
    UnknownDevice(Uuid),

    /// Referenced contract does not exist
    #[error("unknown contract: {0}")]
    UnknownContract(Uuid),

    /// Reading time must be >= the last stored reading time
    #[error("reading time {attempted} is before last reading time {last}")]
    TimeNotMonotonic {
        attempted: DateTime<Utc>,
        last: DateTime<Utc>,
    },

    /// Counter values never decrease
    #[error("monotonicity violated for device {serial_no}: value {attempted} < last value {last}")]
    ValueNotMonotonic {
        serial_no: String,
        attempted: Decimal,
        last: Decimal,
    },

    /// Counter values are non-negative
    #[error("reading value {0} is negative")]
    NegativeValue(Decimal),

    /// Billing period end precedes its start
    #[error("invalid billing period: {to} precedes {from}")]
    InvalidPeriod { from: NaiveDate, to: NaiveDate },

    /// Consumption cannot be computed for an empty window
    #[error("no readings in period for device {0}")]
    NoReadingsInPeriod(Uuid),

    /// Aggregate consumption came back negative (data inconsistency guard)
    #[error("negative consumption {0} (check meter monotony)")]
    NegativeConsumption(Decimal),

    /// Storage failure
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

/// Errors from store operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Uniqueness conflict on the (contract, period) key. The billing
    /// engine consumes this and re-reads; it is never surfaced to callers.
    #[error("invoice already exists for contract {contract_id}, period {period_from}..{period_to}")]
    DuplicateInvoice {
        contract_id: Uuid,
        period_from: NaiveDate,
        period_to: NaiveDate,
    },

    /// Serial number already registered to another device
    #[error("serial number already registered: {0}")]
    DuplicateSerial(String),

    /// Backend failure
    #[error("storage backend error: {0}")]
    Backend(String),
}
