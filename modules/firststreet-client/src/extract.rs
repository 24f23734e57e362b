//! Flattening of the nested `property` object into per-category records.
//!
//! Reads are tolerant: a missing or null parent makes every field below it
//! `null`, and connection lists collapse to `[]`. Only the category object
//! and its factor key are required.

use serde_json::Value;

use crate::error::{FirstStreetError, Result};
use crate::types::{PropertySummary, RiskCategory, RiskRecord};

static NULL: Value = Value::Null;

/// Where a record field comes from inside the category object.
enum Source {
    /// Dotted path, copied as-is.
    Field(&'static str),
    /// Dotted path to a connection, unwrapped to its `edges[].node` list.
    Nodes(&'static str),
}

use Source::{Field, Nodes};

const FLOOD: &[(&str, Source)] = &[
    ("flood_factor", Field("floodFactor")),
    ("risk_direction", Field("riskDirection")),
    ("insurance_requirement", Field("insuranceRequirement")),
    ("adaptation_count", Field("adaptationConnection.totalCount")),
    ("probability", Field("probability")),
    ("insurance_quotes", Field("insuranceQuotes.rates")),
    ("historic_events", Field("historic")),
    ("insights", Field("insights")),
];

const FIRE: &[(&str, Source)] = &[
    ("fire_factor", Field("fireFactor")),
    ("risk_direction", Field("riskDirection")),
    ("defensible_space", Field("defensibleSpace")),
    ("usfs_relative_risk", Field("usfsRelativeRisk")),
    ("prescribed_burns_count", Field("prescribedBurns.totalCount")),
    ("probability", Field("probability")),
    ("historic_events", Nodes("historicConnection")),
    ("insurance_quotes", Field("insuranceHippo.rates")),
    ("insights", Field("insights")),
];

const HEAT: &[(&str, Source)] = &[
    ("heat_factor", Field("heatFactor")),
    ("hot_temperature", Field("hotTemperature")),
    ("anomaly_temperature", Field("anomalyTemperature")),
    ("temperature_average_high", Field("temperatureAverageHigh")),
    ("cooling", Field("cooling")),
    ("heat_waves", Field("heatWaves")),
    ("days", Field("days")),
    ("insights", Field("insights")),
];

const WIND: &[(&str, Source)] = &[
    ("wind_factor", Field("windFactor")),
    ("factor_scale", Field("factorScale")),
    ("risk_direction", Field("riskDirection")),
    ("has_tornado_risk", Field("hasTornadoRisk")),
    ("has_thunderstorm_risk", Field("hasThunderstormRisk")),
    ("has_cyclone_risk", Field("hasCycloneRisk")),
    ("greatest_wind_risk", Field("greatestWindRisk")),
    ("missile_environment", Field("missileEnvironment")),
    ("primary_wind_direction", Field("primaryWindDirection")),
    ("probability", Field("probability")),
    ("historic_events", Nodes("historicConnection")),
];

const AIR: &[(&str, Source)] = &[
    ("air_factor", Field("airFactor")),
    ("factor_scale", Field("factorScale")),
    ("risk_direction", Field("riskDirection")),
    ("days", Field("days")),
    ("greatest_risk", Field("greatestRisk")),
    ("tri_nearby", Field("triNearby")),
    ("tri_facilities", Nodes("triFacilityConnection")),
    ("historic", Field("historic")),
    ("insights", Field("insights")),
    ("percentile", Field("percentile")),
];

fn fields_for(category: RiskCategory) -> &'static [(&'static str, Source)] {
    match category {
        RiskCategory::Flood => FLOOD,
        RiskCategory::Fire => FIRE,
        RiskCategory::Heat => HEAT,
        RiskCategory::Wind => WIND,
        RiskCategory::Air => AIR,
    }
}

/// Flatten one category of the `property` object into a record.
///
/// Fails with [`FirstStreetError::Extraction`] when the category object or
/// its factor key is absent. An explicit `null` factor is kept as `null`.
pub fn extract_category(property: &Value, category: RiskCategory) -> Result<RiskRecord> {
    let object = match property.get(category.as_str()) {
        Some(value @ Value::Object(_)) => value,
        _ => {
            return Err(FirstStreetError::extraction(format!(
                "property.{category}"
            )))
        }
    };

    if object.get(category.factor_field()).is_none() {
        return Err(FirstStreetError::extraction(format!(
            "property.{category}.{}",
            category.factor_field()
        )));
    }

    let mut record = RiskRecord::default();
    for (key, source) in fields_for(category) {
        let value = match source {
            Field(path) => lookup(object, path).clone(),
            Nodes(path) => nodes(lookup(object, path)),
        };
        record.insert(key, value);
    }
    Ok(record)
}

/// Property-level identity fields. Never fails; absent fields are `None`.
pub fn extract_summary(property: &Value) -> PropertySummary {
    PropertySummary {
        fsid: as_u64(lookup(property, "fsid")),
        formatted_address: lookup(property, "address.formattedAddress")
            .as_str()
            .map(String::from),
        is_residential: lookup(property, "isResidential").as_bool(),
        fema_zone: lookup(property, "femaZone").as_str().map(String::from),
        building_count: as_u64(lookup(property, "buildingConnectionTotalCount.totalCount")),
    }
}

/// Follow a dotted path; any missing hop or non-object parent yields `null`.
fn lookup<'a>(value: &'a Value, path: &str) -> &'a Value {
    path.split('.')
        .try_fold(value, |current, key| current.get(key))
        .unwrap_or(&NULL)
}

/// Unwrap a GraphQL connection to its node list. Edges without a node are
/// dropped.
fn nodes(connection: &Value) -> Value {
    let nodes = connection
        .get("edges")
        .and_then(Value::as_array)
        .map(|edges| {
            edges
                .iter()
                .filter_map(|edge| edge.get("node"))
                .filter(|node| !node.is_null())
                .cloned()
                .collect()
        })
        .unwrap_or_default();
    Value::Array(nodes)
}

// Int64 ids arrive as numbers or strings depending on the resolver.
fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
