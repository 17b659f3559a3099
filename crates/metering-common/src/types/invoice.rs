//! Invoices
//!
//! An invoice records consumption and charge for one contract over an
//! inclusive calendar-date period. The (contract, period_from,
//! period_to) triple is unique; the store enforces it.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of an invoice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    Open,
    Paid,
    Cancelled,
}

impl Default for InvoiceStatus {
    fn default() -> Self {
        InvoiceStatus::Open
    }
}

/// A billed period for a contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    /// Unique invoice ID
    pub id: Uuid,
    /// Billed contract
    pub contract_id: Uuid,
    /// Period start, inclusive
    pub period_from: NaiveDate,
    /// Period end, inclusive
    pub period_to: NaiveDate,
    /// Consumption over the period (scale 6)
    pub consumption: Decimal,
    /// Charged amount, rounded per billing configuration
    pub amount: Decimal,
    /// Lifecycle status
    pub status: InvoiceStatus,
    /// Server-side creation time
    pub created_at: DateTime<Utc>,
}

impl Invoice {
    /// Create a freshly computed invoice in `Open` status
    pub fn new(
        contract_id: Uuid,
        period_from: NaiveDate,
        period_to: NaiveDate,
        consumption: Decimal,
        amount: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            contract_id,
            period_from,
            period_to,
            consumption,
            amount,
            status: InvoiceStatus::default(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn new_invoice_starts_open() {
        let invoice = Invoice::new(
            Uuid::new_v4(),
            NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 9, 30).unwrap(),
            dec!(60.500000),
            dec!(15.13),
        );
        assert_eq!(invoice.status, InvoiceStatus::Open);
        assert_eq!(invoice.amount, dec!(15.13));
    }
}
