use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use firststreet_client::{RiskQueryRequest, DEFAULT_BASE_URL};
use serde::Deserialize;

const DEFAULT_CONFIG_PATH: &str = "firststreet.toml";

/// TOML-backed configuration: which properties to watch and how often.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_setup_retry_secs")]
    pub setup_retry_secs: u64,
    #[serde(rename = "property", default)]
    pub properties: Vec<PropertyConfig>,
}

/// One configured property, equivalent to a host config entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PropertyConfig {
    pub fsid: u64,
    #[serde(default)]
    pub building_id: u32,
}

impl PropertyConfig {
    pub fn request(&self) -> RiskQueryRequest {
        RiskQueryRequest::new(self.fsid).with_building(self.building_id)
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_poll_interval_secs() -> u64 {
    3600
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_setup_retry_secs() -> u64 {
    60
}

impl FileConfig {
    /// Parse and validate TOML content.
    pub fn parse(content: &str) -> Result<Self> {
        let config: FileConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.properties.is_empty() {
            bail!("at least one [[property]] entry is required");
        }
        if self.poll_interval_secs == 0 {
            bail!("poll_interval_secs must be greater than zero");
        }
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be greater than zero");
        }
        if self.setup_retry_secs == 0 {
            bail!("setup_retry_secs must be greater than zero");
        }

        // Sensor identity is (fsid, category), so an fsid may appear once.
        let mut seen = HashSet::new();
        for property in &self.properties {
            if property.fsid == 0 {
                bail!("fsid must be a positive integer");
            }
            if !seen.insert(property.fsid) {
                bail!("fsid {} is configured more than once", property.fsid);
            }
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn setup_retry(&self) -> Duration {
        Duration::from_secs(self.setup_retry_secs)
    }

    pub fn log_summary(&self) {
        tracing::info!("Config loaded:");
        tracing::info!("  base_url: {}", self.base_url);
        tracing::info!("  poll_interval_secs: {}", self.poll_interval_secs);
        tracing::info!("  request_timeout_secs: {}", self.request_timeout_secs);
        tracing::info!("  setup_retry_secs: {}", self.setup_retry_secs);
        for property in &self.properties {
            tracing::info!(
                "  property: fsid={} building_id={}",
                property.fsid,
                property.building_id
            );
        }
    }
}

/// Load and parse a TOML config file.
pub fn load_config(path: &Path) -> Result<FileConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    FileConfig::parse(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve the config file from `FIRSTSTREET_CONFIG` (default
/// `firststreet.toml`) and apply `FIRSTSTREET_BASE_URL` if set.
pub fn from_env() -> Result<FileConfig> {
    dotenvy::dotenv().ok();

    let path = std::env::var("FIRSTSTREET_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
    let mut config = load_config(&path)?;

    if let Ok(base_url) = std::env::var("FIRSTSTREET_BASE_URL") {
        if !base_url.is_empty() {
            config.base_url = base_url;
        }
    }
    Ok(config)
}
