//! Contracts and tariffs
//!
//! A contract binds a customer to a device for a date range and
//! references the tariff used to price consumption. Both records are
//! read-only from the core's perspective.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Price per measured unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tariff {
    /// Unique tariff ID
    pub id: Uuid,
    /// Display name, e.g. "Standard"
    pub name: String,
    /// Price per unit (scale 4)
    pub price_per_unit: Decimal,
    /// Unit the price refers to, e.g. "kWh"
    pub unit: String,
}

impl Tariff {
    pub fn new(name: impl Into<String>, price_per_unit: Decimal, unit: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            price_per_unit,
            unit: unit.into(),
        }
    }
}

/// Customer/device binding with an attached tariff
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contract {
    /// Unique contract ID
    pub id: Uuid,
    /// Customer name (simplified modeling, no customer entity)
    pub customer_name: String,
    /// Billed device
    pub device_id: Uuid,
    /// Contract start
    pub start_date: NaiveDate,
    /// Contract end, open-ended when `None`
    pub end_date: Option<NaiveDate>,
    /// Tariff used to price consumption
    pub tariff: Tariff,
}

impl Contract {
    pub fn new(
        customer_name: impl Into<String>,
        device_id: Uuid,
        start_date: NaiveDate,
        tariff: Tariff,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            customer_name: customer_name.into(),
            device_id,
            start_date,
            end_date: None,
            tariff,
        }
    }

    pub fn with_end_date(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }
}
