//! Device - a physical meter (heat, electricity, water)
//!
//! Each device carries a unique serial number and a `last_seen_at`
//! timestamp used to detect devices that have gone silent. The
//! timestamp records the last *contact* with the device, which can
//! diverge from the latest reading's own time under out-of-order
//! delivery.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Operational status of a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceStatus {
    Active,
    Inactive,
    Decommissioned,
}

impl Default for DeviceStatus {
    fn default() -> Self {
        DeviceStatus::Active
    }
}

/// A metering device
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    /// Unique device ID
    pub id: Uuid,
    /// Device type, e.g. "HEAT" or "ELECTRICITY"
    pub device_type: String,
    /// Unique serial number
    pub serial_no: String,
    /// Installation location
    pub location: Option<String>,
    /// Last contact with the device; `None` for devices never seen
    pub last_seen_at: Option<DateTime<Utc>>,
    /// Operational status
    pub status: DeviceStatus,
}

impl Device {
    /// Create a new active device that has never reported
    pub fn new(device_type: impl Into<String>, serial_no: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            device_type: device_type.into(),
            serial_no: serial_no.into(),
            location: None,
            last_seen_at: None,
            status: DeviceStatus::default(),
        }
    }

    /// Set the installation location
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Set the last contact timestamp
    pub fn with_last_seen(mut self, seen_at: DateTime<Utc>) -> Self {
        self.last_seen_at = Some(seen_at);
        self
    }

    /// Whether the device counts as offline relative to a cutoff
    pub fn is_offline(&self, cutoff: DateTime<Utc>) -> bool {
        match self.last_seen_at {
            None => true,
            Some(seen) => seen < cutoff,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn new_device_has_never_been_seen() {
        let device = Device::new("HEAT", "HZ-001");
        assert!(device.last_seen_at.is_none());
        assert_eq!(device.status, DeviceStatus::Active);
    }

    #[test]
    fn offline_check_treats_never_seen_as_offline() {
        let cutoff = Utc::now() - Duration::hours(24);
        let never_seen = Device::new("HEAT", "HZ-001");
        assert!(never_seen.is_offline(cutoff));

        let recently_seen = Device::new("HEAT", "HZ-002").with_last_seen(Utc::now());
        assert!(!recently_seen.is_offline(cutoff));

        let long_gone = Device::new("HEAT", "HZ-003")
            .with_last_seen(Utc::now() - Duration::hours(48));
        assert!(long_gone.is_offline(cutoff));
    }
}
