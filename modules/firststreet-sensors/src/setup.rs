use std::sync::Arc;
use std::time::Duration;

use firststreet_client::{FirstStreetError, RiskDataSource};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::config::PropertyConfig;
use crate::coordinator::RiskCoordinator;
use crate::publish::backend::SensorSink;

#[derive(Debug, Error)]
pub enum SetupError {
    /// The validation fetch failed; setup should be retried later.
    #[error("Property {fsid} not ready: {source}")]
    NotReady {
        fsid: u64,
        #[source]
        source: FirstStreetError,
    },
}

/// Validate a configured property with one fetch and build its coordinator,
/// seeded with that first report.
pub async fn setup_property(
    source: Arc<dyn RiskDataSource>,
    property: PropertyConfig,
    interval: Duration,
) -> Result<RiskCoordinator, SetupError> {
    let request = property.request();
    let report = source
        .fetch_all_risk_data(&request)
        .await
        .map_err(|source| SetupError::NotReady {
            fsid: property.fsid,
            source,
        })?;

    info!(
        fsid = property.fsid,
        building_id = property.building_id,
        address = report.summary.formatted_address.as_deref().unwrap_or("<unknown>"),
        "Property set up"
    );
    Ok(RiskCoordinator::new(source, request, interval).with_report(report))
}

/// Set up a property, retrying every `retry` while it is not ready, then run
/// its refresh loop until shutdown.
pub async fn run_property(
    source: Arc<dyn RiskDataSource>,
    property: PropertyConfig,
    interval: Duration,
    retry: Duration,
    sink: Arc<dyn SensorSink>,
    mut shutdown: watch::Receiver<bool>,
) {
    let coordinator = loop {
        match setup_property(source.clone(), property, interval).await {
            Ok(coordinator) => break coordinator,
            Err(e) => {
                warn!(
                    fsid = property.fsid,
                    error = %e,
                    retry_secs = retry.as_secs(),
                    "Setup failed, retrying later"
                );
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(retry) => {}
            _ = shutdown.changed() => {
                info!(fsid = property.fsid, "Shutdown during setup");
                return;
            }
        }
    };

    Arc::new(coordinator).run(sink, shutdown).await;
}
