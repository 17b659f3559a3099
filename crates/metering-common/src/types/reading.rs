//! Meter readings
//!
//! A reading is a cumulative counter value with a timestamp. Counters
//! only grow; consumption over a period is the difference between the
//! highest and lowest value inside the window. Readings are immutable
//! once persisted.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A persisted meter reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Unique reading ID
    pub id: Uuid,
    /// Device this reading belongs to
    pub device_id: Uuid,
    /// Time the meter was read, UTC
    pub reading_time: DateTime<Utc>,
    /// Cumulative counter value (scale 6)
    pub value: Decimal,
    /// Measured unit, e.g. "kWh"
    pub unit: String,
    /// Origin of the reading, e.g. "LoRa" or "manual"
    pub source: String,
}

/// An incoming reading before validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReading {
    pub device_id: Uuid,
    pub reading_time: DateTime<Utc>,
    pub value: Decimal,
    pub unit: String,
    pub source: String,
}

impl NewReading {
    pub fn new(
        device_id: Uuid,
        reading_time: DateTime<Utc>,
        value: Decimal,
        unit: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            device_id,
            reading_time,
            value,
            unit: unit.into(),
            source: source.into(),
        }
    }
}

impl Reading {
    /// Materialize a validated reading with a fresh ID
    pub fn from_new(new: NewReading) -> Self {
        Self {
            id: Uuid::new_v4(),
            device_id: new.device_id,
            reading_time: new.reading_time,
            value: new.value,
            unit: new.unit,
            source: new.source,
        }
    }
}
