use std::sync::Arc;

use anyhow::{Context, Result};
use firststreet_client::{FirstStreetClient, RiskDataSource};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use firststreet_sensors::{
    config,
    publish::{backend::SensorSink, log::LogSink},
    run_property,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::from_default_env().add_directive("firststreet=info".parse()?);
    if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    info!("First Street sensors starting...");

    // Load config
    let config = config::from_env()?;
    config.log_summary();

    let client = FirstStreetClient::with_base_url(&config.base_url, config.request_timeout())
        .context("Failed to build HTTP client")?;
    let source: Arc<dyn RiskDataSource> = Arc::new(client);
    let sink: Arc<dyn SensorSink> = Arc::new(LogSink);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut tasks = JoinSet::new();
    for property in &config.properties {
        tasks.spawn(run_property(
            source.clone(),
            *property,
            config.poll_interval(),
            config.setup_retry(),
            sink.clone(),
            shutdown_rx.clone(),
        ));
    }

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutdown requested");
    let _ = shutdown_tx.send(true);

    while let Some(result) = tasks.join_next().await {
        if let Err(e) = result {
            warn!(error = %e, "Property task ended abnormally");
        }
    }

    info!("First Street sensors stopped");
    Ok(())
}
