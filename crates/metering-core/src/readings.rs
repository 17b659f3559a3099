//! Reading ingestion
//!
//! Validates incoming readings against the last stored reading of the
//! device: reading time and counter value must both be monotone
//! non-decreasing. Validation failures are terminal for the request;
//! nothing is retried.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, instrument};
use uuid::Uuid;

use metering_common::{MeteringError, NewReading, Reading, Result};
use metering_store::MeteringStore;

/// Validates and persists meter readings
pub struct ReadingService {
    store: Arc<dyn MeteringStore>,
}

impl ReadingService {
    pub fn new(store: Arc<dyn MeteringStore>) -> Self {
        Self { store }
    }

    /// Ingest a reading after validating it against the device's last
    /// known reading.
    ///
    /// On success the device's `last_seen_at` is bumped to the current
    /// wall-clock time. That timestamp tracks last *contact*, not the
    /// reading's own time; the two diverge under out-of-order delivery
    /// within the monotonicity window.
    ///
    /// The check against `latest_reading` and the subsequent write are
    /// separate store calls; concurrent ingestions for one device can
    /// race unless the store serializes writes per device.
    #[instrument(skip(self, new), fields(device_id = %new.device_id))]
    pub async fn ingest(&self, new: NewReading) -> Result<Reading> {
        let mut device = self
            .store
            .device(new.device_id)
            .await?
            .ok_or(MeteringError::UnknownDevice(new.device_id))?;

        // Shape validation happens upstream, but never trust it here.
        if new.value < Decimal::ZERO {
            return Err(MeteringError::NegativeValue(new.value));
        }

        if let Some(last) = self.store.latest_reading(device.id).await? {
            if new.reading_time < last.reading_time {
                return Err(MeteringError::TimeNotMonotonic {
                    attempted: new.reading_time,
                    last: last.reading_time,
                });
            }
            if new.value < last.value {
                return Err(MeteringError::ValueNotMonotonic {
                    serial_no: device.serial_no.clone(),
                    attempted: new.value,
                    last: last.value,
                });
            }
        }

        let reading = Reading::from_new(new);
        self.store.save_reading(reading.clone()).await?;

        device.last_seen_at = Some(Utc::now());
        self.store.save_device(device).await?;

        debug!(reading_id = %reading.id, value = %reading.value, "reading accepted");
        Ok(reading)
    }

    /// All readings of a device, ascending by reading time
    pub async fn list(&self, device_id: Uuid) -> Result<Vec<Reading>> {
        self.store
            .device(device_id)
            .await?
            .ok_or(MeteringError::UnknownDevice(device_id))?;
        Ok(self.store.readings_for_device(device_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone};
    use metering_common::Device;
    use metering_store::InMemoryStore;
    use rust_decimal_macros::dec;

    fn ts(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 12, h, m, s).unwrap()
    }

    async fn service_with_device() -> (ReadingService, Arc<InMemoryStore>, Uuid) {
        let store = Arc::new(InMemoryStore::new());
        let device = Device::new("HEAT", "ABC-123");
        let device_id = device.id;
        store.save_device(device).await.unwrap();
        (ReadingService::new(store.clone()), store, device_id)
    }

    #[tokio::test]
    async fn rejects_unknown_device() {
        let store = Arc::new(InMemoryStore::new());
        let service = ReadingService::new(store);
        let unknown = Uuid::new_v4();

        let err = service
            .ingest(NewReading::new(unknown, ts(10, 0, 0), dec!(100.0), "kWh", "LoRa"))
            .await
            .unwrap_err();
        assert!(matches!(err, MeteringError::UnknownDevice(id) if id == unknown));
    }

    #[tokio::test]
    async fn rejects_reading_if_time_before_last() {
        let (service, _store, device_id) = service_with_device().await;
        service
            .ingest(NewReading::new(device_id, ts(10, 0, 0), dec!(100.0), "kWh", "LoRa"))
            .await
            .unwrap();

        let err = service
            .ingest(NewReading::new(device_id, ts(9, 59, 59), dec!(101.0), "kWh", "LoRa"))
            .await
            .unwrap_err();
        assert!(matches!(err, MeteringError::TimeNotMonotonic { .. }));

        // Nothing new persisted.
        assert_eq!(service.list(device_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rejects_reading_if_value_decreases() {
        let (service, _store, device_id) = service_with_device().await;
        service
            .ingest(NewReading::new(device_id, ts(10, 0, 0), dec!(100.0), "kWh", "LoRa"))
            .await
            .unwrap();

        let err = service
            .ingest(NewReading::new(device_id, ts(10, 0, 1), dec!(99.9), "kWh", "LoRa"))
            .await
            .unwrap_err();
        match err {
            MeteringError::ValueNotMonotonic { serial_no, .. } => {
                assert_eq!(serial_no, "ABC-123");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(service.list(device_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn accepts_equal_time_and_value_and_becomes_latest() {
        let (service, store, device_id) = service_with_device().await;
        service
            .ingest(NewReading::new(device_id, ts(10, 0, 0), dec!(100.0), "kWh", "LoRa"))
            .await
            .unwrap();

        // Equal time, equal value: allowed.
        service
            .ingest(NewReading::new(device_id, ts(10, 0, 0), dec!(100.0), "kWh", "LoRa"))
            .await
            .unwrap();

        let accepted = service
            .ingest(NewReading::new(device_id, ts(11, 0, 0), dec!(105.5), "kWh", "LoRa"))
            .await
            .unwrap();

        let latest = store.latest_reading(device_id).await.unwrap().unwrap();
        assert_eq!(latest.id, accepted.id);
        assert_eq!(latest.value, dec!(105.5));
    }

    #[tokio::test]
    async fn rejects_negative_first_reading() {
        let (service, _store, device_id) = service_with_device().await;
        let err = service
            .ingest(NewReading::new(device_id, ts(10, 0, 0), dec!(-1.0), "kWh", "LoRa"))
            .await
            .unwrap_err();
        assert!(matches!(err, MeteringError::NegativeValue(_)));
    }

    #[tokio::test]
    async fn successful_ingest_bumps_last_seen() {
        let (service, store, device_id) = service_with_device().await;
        assert!(store.device(device_id).await.unwrap().unwrap().last_seen_at.is_none());

        service
            .ingest(NewReading::new(device_id, ts(10, 0, 0), dec!(100.0), "kWh", "LoRa"))
            .await
            .unwrap();

        let device = store.device(device_id).await.unwrap().unwrap();
        assert!(device.last_seen_at.is_some());
    }

    #[tokio::test]
    async fn failed_ingest_does_not_bump_last_seen() {
        let (service, store, device_id) = service_with_device().await;
        service
            .ingest(NewReading::new(device_id, ts(10, 0, 0), dec!(100.0), "kWh", "LoRa"))
            .await
            .unwrap();
        let seen_after_first = store
            .device(device_id)
            .await
            .unwrap()
            .unwrap()
            .last_seen_at;

        let _ = service
            .ingest(NewReading::new(device_id, ts(9, 0, 0), dec!(101.0), "kWh", "LoRa"))
            .await
            .unwrap_err();

        let device = store.device(device_id).await.unwrap().unwrap();
        assert_eq!(device.last_seen_at, seen_after_first);
    }
}
