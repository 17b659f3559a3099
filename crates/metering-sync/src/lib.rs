//! # Metering Sync
//!
//! Best-effort scheduled integration jobs:
//!
//! - [`OfflineReporter`]: finds devices that have gone silent and
//!   reports each one to an external issue-tracking endpoint with a
//!   bounded concurrent fan-out, per-call timeout, retry-with-backoff,
//!   and an overall batch budget.
//! - [`CustomerSync`]: fetches a customer list from a second endpoint
//!   purely for observability (the count is logged).
//!
//! Both jobs log failures and never propagate them to the scheduler.

pub mod client;
pub mod config;
pub mod reporter;
pub mod retry;

pub use client::{
    CustomerDirectory, HttpCustomerDirectory, HttpIssueTracker, IssueTracker, OfflineReport,
    ReportError,
};
pub use config::SyncConfig;
pub use reporter::{CustomerSync, OfflineReporter};
