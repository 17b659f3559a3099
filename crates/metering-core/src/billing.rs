//! Billing engine
//!
//! Computes consumption and charge for a contract over an inclusive
//! calendar-date period and persists the invoice exactly once. The
//! billing window maps to the half-open UTC instant range
//! `[from 00:00, to+1d 00:00)`.
//!
//! Idempotency is two-layered: a pre-check returns an existing invoice
//! without recomputation, and the store's atomic uniqueness constraint
//! on (contract, period) resolves the race where two concurrent runs
//! both pass the pre-check. The loser re-reads and returns the
//! winner's invoice, so callers never observe the conflict.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use metering_common::{Invoice, MeteringError, Result, StoreError, CONSUMPTION_SCALE};
use metering_store::MeteringStore;

use crate::config::BillingConfig;

/// Computes and persists invoices
pub struct BillingService {
    store: Arc<dyn MeteringStore>,
    config: BillingConfig,
}

impl BillingService {
    pub fn new(store: Arc<dyn MeteringStore>, config: BillingConfig) -> Self {
        Self { store, config }
    }

    /// Run billing for a contract over `[period_from, period_to]`
    /// (both dates inclusive).
    #[instrument(skip(self), fields(%contract_id, %period_from, %period_to))]
    pub async fn run(
        &self,
        contract_id: Uuid,
        period_from: NaiveDate,
        period_to: NaiveDate,
    ) -> Result<Invoice> {
        let contract = self
            .store
            .contract(contract_id)
            .await?
            .ok_or(MeteringError::UnknownContract(contract_id))?;

        if period_to < period_from {
            return Err(MeteringError::InvalidPeriod {
                from: period_from,
                to: period_to,
            });
        }

        // Idempotency: an existing invoice for the exact period is
        // returned as-is, with no recomputation.
        if let Some(existing) = self
            .store
            .invoice_for_period(contract_id, period_from, period_to)
            .await?
        {
            debug!(invoice_id = %existing.id, "period already billed");
            return Ok(existing);
        }

        let (from_instant, to_instant) = period_window(period_from, period_to)?;

        let consumption = self
            .store
            .aggregate_consumption(contract.device_id, from_instant, to_instant)
            .await?
            .ok_or(MeteringError::NoReadingsInPeriod(contract.device_id))?;
        if consumption < Decimal::ZERO {
            return Err(MeteringError::NegativeConsumption(consumption));
        }

        let amount = (consumption * contract.tariff.price_per_unit)
            .round_dp_with_strategy(self.config.scale, self.config.rounding);
        let invoice = Invoice::new(
            contract_id,
            period_from,
            period_to,
            consumption.round_dp(CONSUMPTION_SCALE),
            amount,
        );

        match self.store.save_invoice(invoice).await {
            Ok(saved) => {
                info!(invoice_id = %saved.id, amount = %saved.amount, "invoice created");
                Ok(saved)
            }
            Err(StoreError::DuplicateInvoice { .. }) => {
                // A concurrent run committed between our pre-check and
                // the insert; return its invoice instead.
                debug!("lost the period uniqueness race, re-reading");
                self.store
                    .invoice_for_period(contract_id, period_from, period_to)
                    .await?
                    .ok_or_else(|| {
                        StoreError::Backend(
                            "invoice missing after uniqueness conflict".into(),
                        )
                        .into()
                    })
            }
            Err(other) => Err(other.into()),
        }
    }
}

/// Map an inclusive date period to its half-open UTC instant window
fn period_window(
    from: NaiveDate,
    to: NaiveDate,
) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let from_instant = from.and_time(NaiveTime::MIN).and_utc();
    let to_exclusive = to
        .succ_opt()
        .ok_or(MeteringError::InvalidPeriod { from, to })?;
    Ok((from_instant, to_exclusive.and_time(NaiveTime::MIN).and_utc()))
}
