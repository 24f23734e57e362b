use async_trait::async_trait;

use super::backend::SensorSink;
use crate::sensor::SensorState;

/// Discards every state. Used in tests.
pub struct NoopSink;

#[async_trait]
impl SensorSink for NoopSink {
    async fn publish(&self, _states: &[SensorState]) -> anyhow::Result<()> {
        Ok(())
    }
}
