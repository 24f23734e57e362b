pub mod error;
pub mod extract;
pub mod types;

pub use error::{FirstStreetError, Result};
pub use types::{
    CategoryOutcome, PropertySummary, RiskCategory, RiskQueryRequest, RiskRecord, RiskReport,
};

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use serde_json::{json, Value};
use tracing::{debug, error, info};

pub const DEFAULT_BASE_URL: &str = "https://firststreet.org/";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const GRAPHQL_PATH: &str = "api/fsfapi/";

/// Fixed GraphQL document selecting every field the extractors read.
pub const PROPERTY_BY_FSID_QUERY: &str = include_str!("queries/property_by_fsid.graphql");

/// Anything that can produce a full risk report for a property.
#[async_trait]
pub trait RiskDataSource: Send + Sync {
    async fn fetch_all_risk_data(&self, request: &RiskQueryRequest) -> Result<RiskReport>;
}

#[derive(Debug, Clone)]
pub struct FirstStreetClient {
    client: reqwest::Client,
    endpoint: String,
}

impl FirstStreetClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, DEFAULT_TIMEOUT)
    }

    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/{}", base_url.trim_end_matches('/'), GRAPHQL_PATH),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Post the property query and return the `data.property` object.
    pub async fn fetch_property(&self, request: &RiskQueryRequest) -> Result<Value> {
        let payload = json!({
            "query": PROPERTY_BY_FSID_QUERY,
            "variables": request.variables(),
        });

        debug!(
            fsid = request.fsid,
            building_id = request.building_id,
            endpoint = %self.endpoint,
            "Posting First Street property query"
        );

        let result = self.post(&payload, request.fsid).await;
        if let Err(ref err) = result {
            error!(fsid = request.fsid, error = %err, "First Street query failed");
            if let Some(payload) = err.payload() {
                debug!(fsid = request.fsid, %payload, "First Street error details");
            }
        }
        result
    }

    /// Fetch once, then flatten all five categories from the same object.
    pub async fn fetch_all_risk_data(&self, request: &RiskQueryRequest) -> Result<RiskReport> {
        let property = self.fetch_property(request).await?;
        let report = RiskReport::from_property(&property);

        info!(
            fsid = request.fsid,
            building_id = request.building_id,
            failed_categories = report.failed_categories().count(),
            "Fetched First Street risk data"
        );
        Ok(report)
    }

    async fn post(&self, payload: &Value, fsid: u64) -> Result<Value> {
        let resp = self
            .client
            .post(&self.endpoint)
            .header(
                CONTENT_TYPE,
                HeaderValue::from_static("application/json; charset=utf-8"),
            )
            .body(serde_json::to_vec(payload)?)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(FirstStreetError::Transport {
                message: format!("HTTP {status}: {body}"),
                status: Some(status.as_u16()),
            });
        }

        let body = resp.bytes().await?;
        let envelope: Value = serde_json::from_slice(&body)?;
        property_from_envelope(envelope, fsid)
    }
}

#[async_trait]
impl RiskDataSource for FirstStreetClient {
    async fn fetch_all_risk_data(&self, request: &RiskQueryRequest) -> Result<RiskReport> {
        FirstStreetClient::fetch_all_risk_data(self, request).await
    }
}

/// Validate a decoded GraphQL envelope and take out `data.property`.
pub fn property_from_envelope(envelope: Value, fsid: u64) -> Result<Value> {
    let mut root = match envelope {
        Value::Object(root) => root,
        other => {
            return Err(FirstStreetError::malformed(
                "response is not a JSON object",
                Some(other),
            ))
        }
    };

    if let Some(errors) = root.remove("errors") {
        return Err(FirstStreetError::Api { errors });
    }

    let mut data = match root.remove("data") {
        Some(Value::Object(data)) => data,
        _ => {
            return Err(FirstStreetError::malformed(
                "missing data",
                Some(Value::Object(root)),
            ))
        }
    };

    match data.remove("property") {
        None => Err(FirstStreetError::malformed(
            "missing property",
            Some(Value::Object(data)),
        )),
        Some(Value::Null) => Err(FirstStreetError::NotFound { fsid }),
        Some(property) => Ok(property),
    }
}
