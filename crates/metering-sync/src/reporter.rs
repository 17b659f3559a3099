//! Scheduled integration jobs
//!
//! The offline reporter fans out one report per silent device, capped
//! at a fixed number of in-flight calls, and bounds the whole batch
//! with a wall-clock budget scaled to the candidate count. Individual
//! failures are logged and swallowed; the job never raises to its
//! scheduler.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::StreamExt;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};

use metering_store::MeteringStore;

use crate::client::{CustomerDirectory, IssueTracker, OfflineReport, ReportError};
use crate::config::SyncConfig;
use crate::retry::with_retries;

/// Reports silent devices to an external issue tracker
pub struct OfflineReporter {
    store: Arc<dyn MeteringStore>,
    tracker: Arc<dyn IssueTracker>,
    config: SyncConfig,
}

impl OfflineReporter {
    pub fn new(
        store: Arc<dyn MeteringStore>,
        tracker: Arc<dyn IssueTracker>,
        config: SyncConfig,
    ) -> Self {
        Self {
            store,
            tracker,
            config,
        }
    }

    /// Drive [`Self::run_once`] on a fixed interval. Ticks never
    /// overlap: a delayed run pushes subsequent ticks back instead of
    /// firing them in a burst.
    pub async fn run(&self, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.run_once(Utc::now()).await;
        }
    }

    /// One best-effort reporting pass. Never returns an error.
    #[instrument(skip(self))]
    pub async fn run_once(&self, now: DateTime<Utc>) {
        if !self.config.enabled || self.config.issue_endpoint.is_none() {
            debug!("offline reporting disabled or endpoint unconfigured, skipping run");
            return;
        }

        let cutoff = now - chrono::Duration::hours(self.config.offline_hours);
        let candidates = match self.store.stale_devices(cutoff).await {
            Ok(devices) => devices,
            Err(err) => {
                warn!(error = %err, "could not list stale devices, skipping run");
                return;
            }
        };

        if candidates.is_empty() {
            info!(%cutoff, candidates = 0, "offline device sync finished");
            return;
        }

        let total = candidates.len();
        let budget = self.config.batch_budget(total);
        let started = tokio::time::Instant::now();

        let per_call = self.config.request_timeout;
        let max_retries = self.config.max_retries;
        let base_delay = self.config.retry_base_delay;
        let tracker = &self.tracker;

        let batch = futures::stream::iter(candidates).for_each_concurrent(
            self.config.report_concurrency,
            |device| async move {
                let report = OfflineReport::for_device(&device);
                let outcome = with_retries(max_retries, base_delay, || {
                    let tracker = Arc::clone(tracker);
                    let report = report.clone();
                    async move {
                        match tokio::time::timeout(per_call, tracker.report_offline(&report)).await
                        {
                            Ok(result) => result,
                            Err(_) => Err(ReportError::Timeout(per_call)),
                        }
                    }
                })
                .await;

                // Exhausted retries only affect this device.
                if let Err(err) = outcome {
                    warn!(serial_no = %device.serial_no, error = %err, "offline report failed");
                }
            },
        );

        if tokio::time::timeout(budget, batch).await.is_err() {
            warn!(
                budget_ms = budget.as_millis() as u64,
                "batch budget elapsed, abandoning outstanding reports"
            );
        }

        info!(
            %cutoff,
            candidates = total,
            took_ms = started.elapsed().as_millis() as u64,
            "offline device sync finished"
        );
    }
}

/// Fetches the customer list from a second external system; only the
/// count is logged. Runs on a coarser interval than the reporter.
pub struct CustomerSync {
    directory: Arc<dyn CustomerDirectory>,
    config: SyncConfig,
}

impl CustomerSync {
    pub fn new(directory: Arc<dyn CustomerDirectory>, config: SyncConfig) -> Self {
        Self { directory, config }
    }

    /// Drive [`Self::run_once`] on a fixed interval.
    pub async fn run(&self, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.run_once().await;
        }
    }

    /// One fetch; all failures are caught and logged.
    #[instrument(skip(self))]
    pub async fn run_once(&self) {
        if !self.config.enabled || self.config.customers_endpoint.is_none() {
            debug!("customer sync disabled or endpoint unconfigured, skipping run");
            return;
        }

        match tokio::time::timeout(self.config.request_timeout, self.directory.fetch_customers())
            .await
        {
            Ok(Ok(customers)) => {
                info!(fetched = customers.len(), "customer sync finished");
            }
            Ok(Err(err)) => warn!(error = %err, "customer sync failed"),
            Err(_) => warn!(
                timeout_ms = self.config.request_timeout.as_millis() as u64,
                "customer sync timed out"
            ),
        }
    }
}
