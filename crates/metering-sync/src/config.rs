//! Sync job configuration
//!
//! Loaded once at startup and passed into the jobs by value.

use std::cmp;
use std::time::Duration;

/// Configuration for the integration jobs
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Master switch for all sync jobs
    pub enabled: bool,
    /// Endpoint offline-device reports are POSTed to
    pub issue_endpoint: Option<String>,
    /// Endpoint the customer list is fetched from
    pub customers_endpoint: Option<String>,
    /// Hours without contact after which a device counts as offline
    pub offline_hours: i64,
    /// Maximum simultaneously in-flight reports
    pub report_concurrency: usize,
    /// Timeout for a single outbound attempt
    pub request_timeout: Duration,
    /// Retries per report after the first attempt
    pub max_retries: u32,
    /// First backoff delay; doubles per retry
    pub retry_base_delay: Duration,
    /// Hard cap on the whole batch
    pub budget_cap: Duration,
    /// Budget granted per offline candidate
    pub budget_per_candidate: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            issue_endpoint: None,
            customers_endpoint: None,
            offline_hours: 24,
            report_concurrency: 4,
            request_timeout: Duration::from_secs(5),
            max_retries: 2,
            retry_base_delay: Duration::from_millis(200),
            budget_cap: Duration::from_secs(15),
            budget_per_candidate: Duration::from_secs(2),
        }
    }
}

impl SyncConfig {
    /// Load configuration from environment variables (`SYNC_*`),
    /// falling back to defaults for anything unset or unparsable.
    pub fn load() -> Self {
        let mut cfg = Self::default();

        if let Ok(val) = std::env::var("SYNC_ENABLED") {
            if let Ok(v) = val.parse() {
                cfg.enabled = v;
            }
        }
        if let Ok(val) = std::env::var("SYNC_ISSUE_ENDPOINT") {
            if !val.is_empty() {
                cfg.issue_endpoint = Some(val);
            }
        }
        if let Ok(val) = std::env::var("SYNC_CUSTOMERS_ENDPOINT") {
            if !val.is_empty() {
                cfg.customers_endpoint = Some(val);
            }
        }
        if let Ok(val) = std::env::var("SYNC_OFFLINE_HOURS") {
            if let Ok(v) = val.parse() {
                cfg.offline_hours = v;
            }
        }
        if let Ok(val) = std::env::var("SYNC_REPORT_CONCURRENCY") {
            if let Ok(v) = val.parse() {
                cfg.report_concurrency = v;
            }
        }
        if let Ok(val) = std::env::var("SYNC_REQUEST_TIMEOUT_MS") {
            if let Ok(v) = val.parse() {
                cfg.request_timeout = Duration::from_millis(v);
            }
        }
        if let Ok(val) = std::env::var("SYNC_MAX_RETRIES") {
            if let Ok(v) = val.parse() {
                cfg.max_retries = v;
            }
        }
        if let Ok(val) = std::env::var("SYNC_RETRY_BASE_DELAY_MS") {
            if let Ok(v) = val.parse() {
                cfg.retry_base_delay = Duration::from_millis(v);
            }
        }

        cfg
    }

    /// Wall-clock budget for one reporting batch:
    /// `min(budget_cap, budget_per_candidate × candidates)`.
    pub fn batch_budget(&self, candidates: usize) -> Duration {
        cmp::min(
            self.budget_cap,
            self.budget_per_candidate
                .saturating_mul(candidates.min(u32::MAX as usize) as u32),
        )
    }
}
