use serde_json::Value;

use crate::classify::SoilType;
use crate::error::{KmlCableError, Result};

/// Checks a JSON value against the cable collection schema: a
/// `FeatureCollection` whose features are `LineString`s of two or more
/// positions or `Point`s, each with a non-empty `id`, a known `soilType` and
/// a non-negative `depth`.
pub fn validate_collection(value: &Value) -> Result<()> {
    if value.get("type").and_then(Value::as_str) != Some("FeatureCollection") {
        return Err(invalid("type is not FeatureCollection"));
    }
    let features = value
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| invalid("features is not an array"))?;
    for (i, feature) in features.iter().enumerate() {
        validate_feature(feature).map_err(|e| invalid(&format!("feature {}: {}", i, e)))?;
    }
    Ok(())
}

fn invalid(msg: &str) -> KmlCableError {
    KmlCableError::Validation(msg.to_string())
}

fn validate_feature(feature: &Value) -> std::result::Result<(), String> {
    if feature.get("type").and_then(Value::as_str) != Some("Feature") {
        return Err("type is not Feature".to_string());
    }
    let geometry = feature
        .get("geometry")
        .filter(|g| g.is_object())
        .ok_or("missing geometry")?;
    let coordinates = geometry.get("coordinates").ok_or("missing coordinates")?;
    match geometry.get("type").and_then(Value::as_str) {
        Some("LineString") => {
            let positions = coordinates
                .as_array()
                .ok_or("coordinates is not an array")?;
            if positions.len() < 2 {
                return Err(format!("LineString has {} positions", positions.len()));
            }
            if !positions.iter().all(is_position) {
                return Err("LineString has an invalid position".to_string());
            }
        }
        Some("Point") => {
            if !is_position(coordinates) {
                return Err("Point has an invalid position".to_string());
            }
        }
        other => return Err(format!("unsupported geometry {:?}", other)),
    }

    let properties = feature
        .get("properties")
        .filter(|p| p.is_object())
        .ok_or("missing properties")?;
    match properties.get("id").and_then(Value::as_str) {
        Some(id) if !id.is_empty() => {}
        _ => return Err("id is missing or empty".to_string()),
    }
    let soil = properties.get("soilType").and_then(Value::as_str);
    if soil.and_then(SoilType::from_name).is_none() {
        return Err(format!("unknown soilType {:?}", soil));
    }
    match properties.get("depth").and_then(Value::as_f64) {
        Some(depth) if depth >= 0.0 => Ok(()),
        _ => Err("depth is missing or negative".to_string()),
    }
}

fn is_position(value: &Value) -> bool {
    match value.as_array() {
        Some(p) => p.len() >= 2 && p.iter().all(|v| v.as_f64().is_some_and(f64::is_finite)),
        None => false,
    }
}
