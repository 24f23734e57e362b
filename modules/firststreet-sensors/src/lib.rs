pub mod config;
pub mod coordinator;
pub mod publish;
pub mod sensor;
pub mod setup;

pub use config::{FileConfig, PropertyConfig};
pub use coordinator::{CoordinatorState, RefreshOutcome, RiskCoordinator, UpdateFailed};
pub use sensor::{DeviceInfo, RiskSensor, SensorState};
pub use setup::{run_property, setup_property, SetupError};
