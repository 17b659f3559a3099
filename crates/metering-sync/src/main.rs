//! Metering Sync Binary
//!
//! Runs the offline-device reporter and the customer sync on fixed
//! schedules until interrupted.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use metering_common::Device;
use metering_store::{InMemoryStore, MeteringStore};
use metering_sync::{
    CustomerSync, HttpCustomerDirectory, HttpIssueTracker, OfflineReporter, SyncConfig,
};

const REPORT_INTERVAL: Duration = Duration::from_secs(10 * 60);
const CUSTOMER_SYNC_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    info!("Starting metering sync v{}", env!("CARGO_PKG_VERSION"));

    let config = SyncConfig::load();
    info!("Loaded configuration: {:?}", config);

    let store: Arc<dyn MeteringStore> = Arc::new(seed_store().await?);

    let mut tasks = Vec::new();

    match &config.issue_endpoint {
        Some(endpoint) => {
            let tracker = Arc::new(HttpIssueTracker::new(
                endpoint.clone(),
                config.request_timeout,
            )?);
            let reporter = OfflineReporter::new(Arc::clone(&store), tracker, config.clone());
            tasks.push(tokio::spawn(async move {
                reporter.run(REPORT_INTERVAL).await;
            }));
            info!("Offline reporter scheduled every {:?}", REPORT_INTERVAL);
        }
        None => info!("SYNC_ISSUE_ENDPOINT unset, offline reporter idle"),
    }

    match &config.customers_endpoint {
        Some(endpoint) => {
            let directory = Arc::new(HttpCustomerDirectory::new(
                endpoint.clone(),
                config.request_timeout,
            )?);
            let sync = CustomerSync::new(directory, config.clone());
            tasks.push(tokio::spawn(async move {
                sync.run(CUSTOMER_SYNC_INTERVAL).await;
            }));
            info!("Customer sync scheduled every {:?}", CUSTOMER_SYNC_INTERVAL);
        }
        None => info!("SYNC_CUSTOMERS_ENDPOINT unset, customer sync idle"),
    }

    tokio::signal::ctrl_c().await?;
    info!("Received shutdown signal");

    for task in tasks {
        task.abort();
    }

    info!("Shutting down metering sync");
    Ok(())
}

/// A handful of demo devices so the jobs have something to chew on
/// when running without a backing service.
async fn seed_store() -> Result<InMemoryStore> {
    let store = InMemoryStore::new();
    store
        .save_device(Device::new("HEAT_METER", "HZ-1001").with_location("Block A, riser 1"))
        .await?;
    store
        .save_device(Device::new("WATER_METER", "WZ-2001").with_location("Block A, riser 2"))
        .await?;
    store
        .save_device(Device::new("HEAT_METER", "HZ-1002").with_last_seen(chrono::Utc::now()))
        .await?;
    Ok(store)
}
