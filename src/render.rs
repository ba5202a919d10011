//! # Result Rendering
//!
//! Turns a search result into a GeoJSON FeatureCollection for downstream
//! consumers, and the attempt trace into a one-line summary for the terminal.

use crate::search::{AttemptStatus, SearchTrace};
use crate::Region;
use geo::{LineString, Polygon};
use serde_json::{json, Map, Value};

/// Properties attached to every feature of a search result.
pub fn result_properties(
    participants: usize,
    tolerance_minutes: u32,
    trace: &SearchTrace,
) -> Value {
    json!({
        "source": "2GIS Isochrone",
        "participants": participants,
        "transport": trace.transport,
        "reverse": trace.reverse,
        "tolerance_min": tolerance_minutes,
        "attempts": trace.attempts(),
    })
}

/// GeoJSON FeatureCollection with one Polygon feature per region part.
///
/// Every feature carries `properties`. No region (or an empty one) renders as
/// a collection without features.
pub fn feature_collection(region: Option<&Region>, properties: &Value) -> Value {
    let properties = match properties {
        Value::Object(map) => Value::Object(map.clone()),
        _ => Value::Object(Map::new()),
    };

    let features: Vec<Value> = region
        .map(|region| {
            region
                .0
                .iter()
                .map(|polygon| {
                    json!({
                        "type": "Feature",
                        "properties": properties,
                        "geometry": polygon_geometry(polygon),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    json!({
        "type": "FeatureCollection",
        "features": features,
    })
}

fn polygon_geometry(polygon: &Polygon<f64>) -> Value {
    let rings: Vec<Value> = std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(ring_coordinates)
        .collect();
    json!({ "type": "Polygon", "coordinates": rings })
}

fn ring_coordinates(ring: &LineString<f64>) -> Value {
    Value::Array(ring.coords().map(|c| json!([c.x, c.y])).collect())
}

/// Short summary such as `20 min: retry, 30 min: found`.
pub fn describe_trace(trace: &SearchTrace) -> String {
    if trace.is_empty() {
        return "no attempts (start above cap)".to_string();
    }
    trace
        .attempts()
        .iter()
        .map(|a| {
            let tag = match a.status {
                AttemptStatus::IntersectionFound => "found",
                AttemptStatus::NoIntersectionRetry => "retry",
            };
            format!("{} min: {tag}", a.t_minutes)
        })
        .collect::<Vec<_>>()
        .join(", ")
}
