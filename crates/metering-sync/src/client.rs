//! Outbound HTTP clients for the sync jobs
//!
//! The jobs talk to external systems through the [`IssueTracker`] and
//! [`CustomerDirectory`] seams; the reqwest-backed implementations
//! live here, test doubles live with the tests.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use metering_common::Device;

/// Failure of a single outbound call
#[derive(Debug, Clone, Error)]
pub enum ReportError {
    /// Endpoint answered with an error status code
    #[error("endpoint returned status {0}")]
    Status(u16),

    /// The attempt exceeded its timeout
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Connection-level failure
    #[error("transport error: {0}")]
    Transport(String),
}

impl ReportError {
    /// Server errors (5xx) and network-level failures are considered
    /// transient; client errors (4xx) are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            ReportError::Status(status) => *status >= 500,
            ReportError::Timeout(_) | ReportError::Transport(_) => true,
        }
    }
}

/// Payload POSTed for an offline device
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfflineReport {
    pub summary: String,
    pub device_id: String,
    pub last_seen_at: Option<String>,
}

impl OfflineReport {
    pub fn for_device(device: &Device) -> Self {
        Self {
            summary: format!("Device offline: {}", device.serial_no),
            device_id: device.id.to_string(),
            last_seen_at: device.last_seen_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Where offline-device reports go
#[async_trait]
pub trait IssueTracker: Send + Sync {
    async fn report_offline(&self, report: &OfflineReport) -> Result<(), ReportError>;
}

/// Source of the customer list fetched for observability
#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    async fn fetch_customers(&self) -> Result<Vec<String>, ReportError>;
}

fn classify(err: reqwest::Error, timeout: Duration) -> ReportError {
    if err.is_timeout() {
        ReportError::Timeout(timeout)
    } else {
        ReportError::Transport(err.to_string())
    }
}

/// reqwest-backed issue tracker client
pub struct HttpIssueTracker {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpIssueTracker {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ReportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ReportError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            timeout,
        })
    }
}

#[async_trait]
impl IssueTracker for HttpIssueTracker {
    async fn report_offline(&self, report: &OfflineReport) -> Result<(), ReportError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(report)
            .send()
            .await
            .map_err(|e| classify(e, self.timeout))?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(ReportError::Status(status.as_u16()));
        }
        // Any non-error status counts as success; the body is ignored.
        Ok(())
    }
}

/// reqwest-backed customer directory client
pub struct HttpCustomerDirectory {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpCustomerDirectory {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ReportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ReportError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            timeout,
        })
    }
}

#[async_trait]
impl CustomerDirectory for HttpCustomerDirectory {
    async fn fetch_customers(&self) -> Result<Vec<String>, ReportError> {
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|e| classify(e, self.timeout))?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(ReportError::Status(status.as_u16()));
        }

        response
            .json::<Vec<String>>()
            .await
            .map_err(|e| ReportError::Transport(e.to_string()))
    }
}
