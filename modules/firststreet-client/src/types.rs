use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::extract;

// --- Request ---

/// Identifies one property (and optionally one building) to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RiskQueryRequest {
    pub fsid: u64,
    /// 0 selects property-level data.
    #[serde(default)]
    pub building_id: u32,
}

impl RiskQueryRequest {
    pub fn new(fsid: u64) -> Self {
        Self {
            fsid,
            building_id: 0,
        }
    }

    pub fn with_building(mut self, building_id: u32) -> Self {
        self.building_id = building_id;
        self
    }

    /// GraphQL variables. The provider expects both ids string-encoded.
    pub fn variables(&self) -> Value {
        json!({
            "fsid": self.fsid.to_string(),
            "buildingId": self.building_id.to_string(),
        })
    }
}

// --- Categories ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskCategory {
    Flood,
    Fire,
    Heat,
    Wind,
    Air,
}

impl RiskCategory {
    pub const ALL: [RiskCategory; 5] = [
        RiskCategory::Flood,
        RiskCategory::Fire,
        RiskCategory::Heat,
        RiskCategory::Wind,
        RiskCategory::Air,
    ];

    /// Key of the category object under `property`.
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::Flood => "flood",
            RiskCategory::Fire => "fire",
            RiskCategory::Heat => "heat",
            RiskCategory::Wind => "wind",
            RiskCategory::Air => "air",
        }
    }

    /// Source field holding the factor inside the category object.
    pub fn factor_field(&self) -> &'static str {
        match self {
            RiskCategory::Flood => "floodFactor",
            RiskCategory::Fire => "fireFactor",
            RiskCategory::Heat => "heatFactor",
            RiskCategory::Wind => "windFactor",
            RiskCategory::Air => "airFactor",
        }
    }

    /// Record key the factor is stored under.
    pub fn factor_key(&self) -> &'static str {
        match self {
            RiskCategory::Flood => "flood_factor",
            RiskCategory::Fire => "fire_factor",
            RiskCategory::Heat => "heat_factor",
            RiskCategory::Wind => "wind_factor",
            RiskCategory::Air => "air_factor",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskCategory::Flood => "Flood",
            RiskCategory::Fire => "Fire",
            RiskCategory::Heat => "Heat",
            RiskCategory::Wind => "Wind",
            RiskCategory::Air => "Air",
        }
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Records ---

/// Flat field map for one risk category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RiskRecord(Map<String, Value>);

impl RiskRecord {
    pub(crate) fn insert(&mut self, key: &str, value: Value) {
        self.0.insert(key.to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// Per-category result of an aggregate fetch. A failed category serializes
/// as `{"error": "<message>"}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CategoryOutcome {
    Record(RiskRecord),
    Failed { error: String },
}

impl CategoryOutcome {
    pub fn record(&self) -> Option<&RiskRecord> {
        match self {
            CategoryOutcome::Record(record) => Some(record),
            CategoryOutcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            CategoryOutcome::Failed { error } => Some(error),
            CategoryOutcome::Record(_) => None,
        }
    }

    /// Attribute map exposed to display entities.
    pub fn attributes(&self) -> Map<String, Value> {
        match self {
            CategoryOutcome::Record(record) => record.fields().clone(),
            CategoryOutcome::Failed { error } => {
                let mut map = Map::with_capacity(1);
                map.insert("error".to_string(), Value::String(error.clone()));
                map
            }
        }
    }
}

/// Property-level identity fields returned alongside the risk categories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PropertySummary {
    pub fsid: Option<u64>,
    pub formatted_address: Option<String>,
    pub is_residential: Option<bool>,
    pub fema_zone: Option<String>,
    pub building_count: Option<u64>,
}

/// All five category outcomes for one property.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskReport {
    pub flood: CategoryOutcome,
    pub fire: CategoryOutcome,
    pub heat: CategoryOutcome,
    pub wind: CategoryOutcome,
    pub air: CategoryOutcome,
    pub summary: PropertySummary,
}

impl RiskReport {
    /// Runs every category extractor against the same `property` object.
    /// A failing category becomes an error marker; the others still extract.
    pub fn from_property(property: &Value) -> Self {
        let outcome = |category| match extract::extract_category(property, category) {
            Ok(record) => CategoryOutcome::Record(record),
            Err(err) => {
                tracing::warn!(%category, error = %err, "Risk category extraction failed");
                CategoryOutcome::Failed {
                    error: err.to_string(),
                }
            }
        };

        Self {
            flood: outcome(RiskCategory::Flood),
            fire: outcome(RiskCategory::Fire),
            heat: outcome(RiskCategory::Heat),
            wind: outcome(RiskCategory::Wind),
            air: outcome(RiskCategory::Air),
            summary: extract::extract_summary(property),
        }
    }

    pub fn get(&self, category: RiskCategory) -> &CategoryOutcome {
        match category {
            RiskCategory::Flood => &self.flood,
            RiskCategory::Fire => &self.fire,
            RiskCategory::Heat => &self.heat,
            RiskCategory::Wind => &self.wind,
            RiskCategory::Air => &self.air,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (RiskCategory, &CategoryOutcome)> {
        RiskCategory::ALL.into_iter().map(|c| (c, self.get(c)))
    }

    /// The category's factor, when its record extracted and the value is non-null.
    pub fn factor(&self, category: RiskCategory) -> Option<&Value> {
        self.get(category)
            .record()?
            .get(category.factor_key())
            .filter(|v| !v.is_null())
    }

    pub fn failed_categories(&self) -> impl Iterator<Item = RiskCategory> + '_ {
        self.iter()
            .filter(|(_, outcome)| outcome.error().is_some())
            .map(|(category, _)| category)
    }
}
