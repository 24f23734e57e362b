//! The per-category risk sensor entity.
//!
//! One parametrized type covers all five categories; state and attributes
//! are read out of the coordinator's cached report.

use chrono::{DateTime, Utc};
use firststreet_client::{RiskCategory, RiskReport};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::coordinator::CoordinatorState;

pub const DOMAIN: &str = "firststreet";

const MANUFACTURER: &str = "First Street";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RiskSensor {
    fsid: u64,
    category: RiskCategory,
}

impl RiskSensor {
    pub fn new(fsid: u64, category: RiskCategory) -> Self {
        Self { fsid, category }
    }

    /// One sensor per category, in category order.
    pub fn all(fsid: u64) -> Vec<Self> {
        RiskCategory::ALL
            .into_iter()
            .map(|category| Self::new(fsid, category))
            .collect()
    }

    pub fn unique_id(&self) -> String {
        format!("{DOMAIN}_{}_{}", self.fsid, self.category)
    }

    pub fn name(&self) -> String {
        format!("FirstStreet {}", self.category.label())
    }

    pub fn native_value(&self, report: &RiskReport) -> Option<Value> {
        report.factor(self.category).cloned()
    }

    pub fn attributes(&self, report: &RiskReport) -> Map<String, Value> {
        report.get(self.category).attributes()
    }

    pub fn device(&self, report: Option<&RiskReport>) -> DeviceInfo {
        let address = report.and_then(|r| r.summary.formatted_address.clone());
        DeviceInfo {
            identifier: format!("{DOMAIN}_{}", self.fsid),
            name: address.unwrap_or_else(|| format!("FirstStreet {}", self.fsid)),
            manufacturer: MANUFACTURER,
        }
    }

    /// Snapshot of this sensor for publishing.
    pub fn state(&self, coordinator: &CoordinatorState) -> SensorState {
        let report = coordinator.data.as_ref();
        SensorState {
            unique_id: self.unique_id(),
            name: self.name(),
            category: self.category,
            state_class: "measurement",
            native_value: report.and_then(|r| self.native_value(r)),
            attributes: report.map(|r| self.attributes(r)).unwrap_or_default(),
            available: report.is_some() && coordinator.last_update_success,
            last_updated: coordinator.last_updated,
            device: self.device(report),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceInfo {
    pub identifier: String,
    pub name: String,
    pub manufacturer: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorState {
    pub unique_id: String,
    pub name: String,
    pub category: RiskCategory,
    pub state_class: &'static str,
    pub native_value: Option<Value>,
    pub attributes: Map<String, Value>,
    pub available: bool,
    pub last_updated: Option<DateTime<Utc>>,
    pub device: DeviceInfo,
}
