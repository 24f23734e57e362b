use async_trait::async_trait;

use crate::sensor::SensorState;

/// Pluggable destination for sensor states after each poll.
#[async_trait]
pub trait SensorSink: Send + Sync {
    async fn publish(&self, states: &[SensorState]) -> anyhow::Result<()>;
}
