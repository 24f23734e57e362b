use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use firststreet_client::{FirstStreetError, RiskDataSource, RiskQueryRequest, RiskReport};
use thiserror::Error;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::publish::backend::SensorSink;
use crate::sensor::{RiskSensor, SensorState};

/// A scheduled refresh did not produce new data. Previous values stay.
#[derive(Debug, Error)]
#[error("Error communicating with API: {0}")]
pub struct UpdateFailed(#[from] pub FirstStreetError);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Updated,
    /// Another refresh was already in flight.
    Skipped,
}

/// Latest data held by a coordinator.
#[derive(Debug, Clone, Default)]
pub struct CoordinatorState {
    pub data: Option<RiskReport>,
    pub last_updated: Option<DateTime<Utc>>,
    pub last_update_success: bool,
    pub last_error: Option<String>,
}

/// Polls one property on a fixed interval and caches the last good report.
pub struct RiskCoordinator {
    source: Arc<dyn RiskDataSource>,
    request: RiskQueryRequest,
    interval: Duration,
    state: RwLock<CoordinatorState>,
    in_flight: Mutex<()>,
}

impl RiskCoordinator {
    pub fn new(
        source: Arc<dyn RiskDataSource>,
        request: RiskQueryRequest,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            request,
            interval,
            state: RwLock::new(CoordinatorState::default()),
            in_flight: Mutex::new(()),
        }
    }

    /// Start with an already-fetched report (the setup validation fetch).
    pub fn with_report(mut self, report: RiskReport) -> Self {
        self.state = RwLock::new(CoordinatorState {
            data: Some(report),
            last_updated: Some(Utc::now()),
            last_update_success: true,
            last_error: None,
        });
        self
    }

    pub async fn snapshot(&self) -> CoordinatorState {
        self.state.read().await.clone()
    }

    /// Fetch once. A failure leaves the cached report untouched.
    pub async fn refresh(&self) -> Result<RefreshOutcome, UpdateFailed> {
        let Ok(_guard) = self.in_flight.try_lock() else {
            debug!(fsid = self.request.fsid, "Refresh already in flight, skipping");
            return Ok(RefreshOutcome::Skipped);
        };

        match self.source.fetch_all_risk_data(&self.request).await {
            Ok(report) => {
                let mut state = self.state.write().await;
                state.data = Some(report);
                state.last_updated = Some(Utc::now());
                state.last_update_success = true;
                state.last_error = None;
                info!(fsid = self.request.fsid, "Risk data refreshed");
                Ok(RefreshOutcome::Updated)
            }
            Err(err) => {
                let failed = UpdateFailed(err);
                let mut state = self.state.write().await;
                state.last_update_success = false;
                state.last_error = Some(failed.to_string());
                warn!(
                    fsid = self.request.fsid,
                    retryable = failed.0.is_retryable(),
                    error = %failed,
                    "Risk data refresh failed"
                );
                Err(failed)
            }
        }
    }

    pub async fn sensor_states(&self) -> Vec<SensorState> {
        let state = self.state.read().await;
        RiskSensor::all(self.request.fsid)
            .iter()
            .map(|sensor| sensor.state(&state))
            .collect()
    }

    /// Publish current states, then refresh and publish every interval until
    /// `shutdown` turns true.
    pub async fn run(
        self: Arc<Self>,
        sink: Arc<dyn SensorSink>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        info!(
            fsid = self.request.fsid,
            interval_secs = self.interval.as_secs(),
            "Starting risk refresh loop"
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately; setup already fetched.
        ticker.tick().await;
        self.publish(sink.as_ref()).await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
            }

            // Failures are logged by refresh; the sensors still republish
            // so availability reflects the failed poll.
            let _ = self.refresh().await;
            self.publish(sink.as_ref()).await;
        }

        info!(fsid = self.request.fsid, "Risk refresh loop stopped");
    }

    async fn publish(&self, sink: &dyn SensorSink) {
        let states = self.sensor_states().await;
        if let Err(e) = sink.publish(&states).await {
            warn!(fsid = self.request.fsid, error = %e, "Failed to publish sensor states");
        }
    }
}
