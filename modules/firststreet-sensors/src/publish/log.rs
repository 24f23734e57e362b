use async_trait::async_trait;
use tracing::info;

use super::backend::SensorSink;
use crate::sensor::SensorState;

/// Writes each sensor state as a structured log event.
pub struct LogSink;

#[async_trait]
impl SensorSink for LogSink {
    async fn publish(&self, states: &[SensorState]) -> anyhow::Result<()> {
        for state in states {
            let attributes = serde_json::to_string(&state.attributes)?;
            let value = state
                .native_value
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "unknown".to_string());

            info!(
                unique_id = %state.unique_id,
                name = %state.name,
                device = %state.device.name,
                available = state.available,
                state = %value,
                attributes = %attributes,
                "Sensor state"
            );
        }
        Ok(())
    }
}
