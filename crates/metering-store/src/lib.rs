//! # Metering Store
//!
//! The data store seam consumed by reading ingestion, billing, and the
//! offline reporter, plus a concurrent in-memory implementation.
//!
//! Transactional guarantees live behind this trait: `save_invoice`
//! must make its uniqueness check and insert atomic, because the
//! billing engine relies on `StoreError::DuplicateInvoice` to resolve
//! concurrent duplicate billing runs.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use metering_common::{Contract, Device, Invoice, Reading, StoreError};

pub use memory::InMemoryStore;

/// Storage backend for metering records
#[async_trait]
pub trait MeteringStore: Send + Sync {
    /// Point lookup of a device
    async fn device(&self, id: Uuid) -> Result<Option<Device>, StoreError>;

    /// Insert or update a device. Fails with [`StoreError::DuplicateSerial`]
    /// when the serial number belongs to a different device.
    async fn save_device(&self, device: Device) -> Result<(), StoreError>;

    /// The most recent reading of a device by reading time, if any.
    ///
    /// Callers that validate against this value and then write are not
    /// serialized by the store: two concurrent ingestions for the same
    /// device can both observe the same "latest" reading. Backends
    /// that need to close this gap must enforce an ordering constraint
    /// on (device_id, reading_time).
    async fn latest_reading(&self, device_id: Uuid) -> Result<Option<Reading>, StoreError>;

    /// All readings of a device, ascending by reading time
    async fn readings_for_device(&self, device_id: Uuid) -> Result<Vec<Reading>, StoreError>;

    /// Append a reading
    async fn save_reading(&self, reading: Reading) -> Result<(), StoreError>;

    /// Point lookup of a contract
    async fn contract(&self, id: Uuid) -> Result<Option<Contract>, StoreError>;

    /// Invoice for an exact (contract, period) triple, if one exists
    async fn invoice_for_period(
        &self,
        contract_id: Uuid,
        period_from: NaiveDate,
        period_to: NaiveDate,
    ) -> Result<Option<Invoice>, StoreError>;

    /// Persist an invoice. The uniqueness check on (contract,
    /// period_from, period_to) and the insert are atomic; a conflict
    /// yields [`StoreError::DuplicateInvoice`].
    async fn save_invoice(&self, invoice: Invoice) -> Result<Invoice, StoreError>;

    /// Server-side aggregate: `max(value) - min(value)` over the
    /// device's readings with `from <= reading_time < to`. `None` when
    /// no readings fall inside the window.
    async fn aggregate_consumption(
        &self,
        device_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Option<Decimal>, StoreError>;

    /// Devices never seen or last seen before the cutoff
    async fn stale_devices(&self, cutoff: DateTime<Utc>) -> Result<Vec<Device>, StoreError>;
}
