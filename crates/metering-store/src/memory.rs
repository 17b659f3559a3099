//! In-memory store implementation
//!
//! Backed by `DashMap` for concurrent access. The invoice period
//! index uses the map entry API, so the uniqueness check and insert
//! for one (contract, period) key happen under a single shard lock.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rust_decimal::Decimal;
use uuid::Uuid;

use metering_common::{Contract, Device, Invoice, Reading, StoreError};

use crate::MeteringStore;

type PeriodKey = (Uuid, NaiveDate, NaiveDate);

/// Concurrent in-memory storage for metering records
#[derive(Default)]
pub struct InMemoryStore {
    devices: DashMap<Uuid, Device>,
    /// Unique serial number index
    by_serial: DashMap<String, Uuid>,
    /// Readings per device, in insertion order
    readings: DashMap<Uuid, Vec<Reading>>,
    contracts: DashMap<Uuid, Contract>,
    invoices: DashMap<Uuid, Invoice>,
    /// Uniqueness index on (contract, period_from, period_to)
    invoice_periods: DashMap<PeriodKey, Uuid>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a contract. Contracts are read-only for the core, so
    /// this is seeding/demo plumbing rather than part of the seam.
    pub fn insert_contract(&self, contract: Contract) {
        self.contracts.insert(contract.id, contract);
    }

    /// Number of stored invoices
    pub fn invoice_count(&self) -> usize {
        self.invoices.len()
    }
}

#[async_trait]
impl MeteringStore for InMemoryStore {
    async fn device(&self, id: Uuid) -> Result<Option<Device>, StoreError> {
        Ok(self.devices.get(&id).map(|d| d.clone()))
    }

    async fn save_device(&self, device: Device) -> Result<(), StoreError> {
        let serial = device.serial_no.clone();
        match self.by_serial.entry(serial.clone()) {
            Entry::Occupied(slot) if *slot.get() != device.id => {
                return Err(StoreError::DuplicateSerial(serial));
            }
            Entry::Occupied(_) => {}
            Entry::Vacant(slot) => {
                slot.insert(device.id);
            }
        }

        if let Some(prev) = self.devices.insert(device.id, device) {
            if prev.serial_no != serial {
                self.by_serial.remove(&prev.serial_no);
            }
        }
        Ok(())
    }

    async fn latest_reading(&self, device_id: Uuid) -> Result<Option<Reading>, StoreError> {
        Ok(self.readings.get(&device_id).and_then(|list| {
            list.iter()
                .max_by_key(|r| r.reading_time)
                .cloned()
        }))
    }

    async fn readings_for_device(&self, device_id: Uuid) -> Result<Vec<Reading>, StoreError> {
        let mut list = self
            .readings
            .get(&device_id)
            .map(|list| list.clone())
            .unwrap_or_default();
        list.sort_by_key(|r| r.reading_time);
        Ok(list)
    }

    async fn save_reading(&self, reading: Reading) -> Result<(), StoreError> {
        self.readings
            .entry(reading.device_id)
            .or_default()
            .push(reading);
        Ok(())
    }

    async fn contract(&self, id: Uuid) -> Result<Option<Contract>, StoreError> {
        Ok(self.contracts.get(&id).map(|c| c.clone()))
    }

    async fn invoice_for_period(
        &self,
        contract_id: Uuid,
        period_from: NaiveDate,
        period_to: NaiveDate,
    ) -> Result<Option<Invoice>, StoreError> {
        let key = (contract_id, period_from, period_to);
        Ok(self
            .invoice_periods
            .get(&key)
            .and_then(|id| self.invoices.get(&id).map(|i| i.clone())))
    }

    async fn save_invoice(&self, invoice: Invoice) -> Result<Invoice, StoreError> {
        let key = (invoice.contract_id, invoice.period_from, invoice.period_to);
        match self.invoice_periods.entry(key) {
            Entry::Occupied(_) => Err(StoreError::DuplicateInvoice {
                contract_id: invoice.contract_id,
                period_from: invoice.period_from,
                period_to: invoice.period_to,
            }),
            Entry::Vacant(slot) => {
                // Insert the record before publishing the index entry so
                // readers that see the key always find the invoice.
                self.invoices.insert(invoice.id, invoice.clone());
                slot.insert(invoice.id);
                Ok(invoice)
            }
        }
    }

    async fn aggregate_consumption(
        &self,
        device_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Option<Decimal>, StoreError> {
        let Some(list) = self.readings.get(&device_id) else {
            return Ok(None);
        };

        let mut min: Option<Decimal> = None;
        let mut max: Option<Decimal> = None;
        for reading in list.iter() {
            if reading.reading_time >= from && reading.reading_time < to {
                min = Some(min.map_or(reading.value, |m| m.min(reading.value)));
                max = Some(max.map_or(reading.value, |m| m.max(reading.value)));
            }
        }

        Ok(match (min, max) {
            (Some(min), Some(max)) => Some(max - min),
            _ => None,
        })
    }

    async fn stale_devices(&self, cutoff: DateTime<Utc>) -> Result<Vec<Device>, StoreError> {
        Ok(self
            .devices
            .iter()
            .filter(|d| d.is_offline(cutoff))
            .map(|d| d.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use metering_common::NewReading;
    use rust_decimal_macros::dec;

    fn ts(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 12, h, m, 0).unwrap()
    }

    fn reading(device_id: Uuid, at: DateTime<Utc>, value: Decimal) -> Reading {
        Reading::from_new(NewReading::new(device_id, at, value, "kWh", "LoRa"))
    }

    #[tokio::test]
    async fn save_and_fetch_device() {
        let store = InMemoryStore::new();
        let device = Device::new("HEAT", "HZ-001");
        let id = device.id;

        store.save_device(device).await.unwrap();
        let fetched = store.device(id).await.unwrap().unwrap();
        assert_eq!(fetched.serial_no, "HZ-001");
    }

    #[tokio::test]
    async fn rejects_duplicate_serial_for_other_device() {
        let store = InMemoryStore::new();
        store.save_device(Device::new("HEAT", "HZ-001")).await.unwrap();

        let err = store
            .save_device(Device::new("HEAT", "HZ-001"))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::DuplicateSerial("HZ-001".into()));
    }

    #[tokio::test]
    async fn upsert_same_device_keeps_serial() {
        let store = InMemoryStore::new();
        let mut device = Device::new("HEAT", "HZ-001");
        store.save_device(device.clone()).await.unwrap();

        device.last_seen_at = Some(Utc::now());
        store.save_device(device.clone()).await.unwrap();

        let fetched = store.device(device.id).await.unwrap().unwrap();
        assert!(fetched.last_seen_at.is_some());
    }

    #[tokio::test]
    async fn latest_reading_orders_by_time_not_insertion() {
        let store = InMemoryStore::new();
        let device_id = Uuid::new_v4();

        store
            .save_reading(reading(device_id, ts(12, 0), dec!(110)))
            .await
            .unwrap();
        store
            .save_reading(reading(device_id, ts(10, 0), dec!(100)))
            .await
            .unwrap();

        let latest = store.latest_reading(device_id).await.unwrap().unwrap();
        assert_eq!(latest.value, dec!(110));

        let listed = store.readings_for_device(device_id).await.unwrap();
        assert_eq!(listed[0].value, dec!(100));
        assert_eq!(listed[1].value, dec!(110));
    }

    #[tokio::test]
    async fn aggregate_uses_half_open_window() {
        let store = InMemoryStore::new();
        let device_id = Uuid::new_v4();
        let from = ts(10, 0);
        let to = ts(12, 0);

        // On the lower bound: included.
        store
            .save_reading(reading(device_id, from, dec!(100.000000)))
            .await
            .unwrap();
        store
            .save_reading(reading(device_id, ts(11, 0), dec!(130.500000)))
            .await
            .unwrap();
        // On the upper bound: excluded.
        store
            .save_reading(reading(device_id, to, dec!(999.000000)))
            .await
            .unwrap();

        let consumption = store
            .aggregate_consumption(device_id, from, to)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(consumption, dec!(30.500000));
    }

    #[tokio::test]
    async fn aggregate_is_none_for_empty_window() {
        let store = InMemoryStore::new();
        let device_id = Uuid::new_v4();
        store
            .save_reading(reading(device_id, ts(9, 0), dec!(100)))
            .await
            .unwrap();

        let result = store
            .aggregate_consumption(device_id, ts(10, 0), ts(12, 0))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn duplicate_invoice_period_is_rejected_atomically() {
        let store = InMemoryStore::new();
        let contract_id = Uuid::new_v4();
        let from = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2025, 9, 30).unwrap();

        let first = Invoice::new(contract_id, from, to, dec!(60.5), dec!(15.13));
        let first_id = first.id;
        store.save_invoice(first).await.unwrap();

        let second = Invoice::new(contract_id, from, to, dec!(60.5), dec!(15.13));
        let err = store.save_invoice(second).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateInvoice { .. }));

        let existing = store
            .invoice_for_period(contract_id, from, to)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(existing.id, first_id);
        assert_eq!(store.invoice_count(), 1);
    }

    #[tokio::test]
    async fn stale_devices_include_never_seen() {
        let store = InMemoryStore::new();
        let cutoff = Utc::now() - Duration::hours(24);

        store.save_device(Device::new("HEAT", "HZ-001")).await.unwrap();
        store
            .save_device(Device::new("HEAT", "HZ-002").with_last_seen(Utc::now()))
            .await
            .unwrap();
        store
            .save_device(
                Device::new("HEAT", "HZ-003").with_last_seen(Utc::now() - Duration::hours(48)),
            )
            .await
            .unwrap();

        let stale = store.stale_devices(cutoff).await.unwrap();
        let mut serials: Vec<_> = stale.iter().map(|d| d.serial_no.clone()).collect();
        serials.sort();
        assert_eq!(serials, vec!["HZ-001", "HZ-003"]);
    }
}
