use std::collections::BTreeMap;

use chrono::NaiveDate;
use geojson::{Feature, JsonObject, feature::Id};
use serde::{Deserialize, Serialize};

use crate::classify::SoilType;
use crate::error::{KmlCableError, Result};
use crate::geodesy::SegmentInfo;
use crate::geometry::CableGeometry;
use crate::style::StyleRecord;

/// Properties attached to every emitted cable feature.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CableProperties {
    pub id: String,
    pub soil_type: SoilType,
    /// Meters, always `soil_type.depth()`.
    pub depth: f64,
    pub name: String,
    /// `YYYY-MM-DD`
    pub install_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<StyleRecord>,
    #[serde(default)]
    pub segments: Vec<SegmentInfo>,
    /// Meters.
    #[serde(default)]
    pub total_distance: f64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl CableProperties {
    pub fn from_feature(feature: &Feature) -> Option<Self> {
        let props = feature.properties.clone()?;
        serde_json::from_value(serde_json::Value::Object(props)).ok()
    }
}

/// Everything known about one route before it gets an id.
#[derive(Clone, Debug)]
pub struct CableDraft {
    pub geometry: CableGeometry,
    pub soil_type: SoilType,
    pub name: Option<String>,
    pub style: Option<StyleRecord>,
    pub segments: Vec<SegmentInfo>,
    pub total_distance: f64,
    pub metadata: BTreeMap<String, String>,
}

/// `cable-001`, `cable-042`, `cable-1234`.
pub fn cable_id(index: usize) -> String {
    format!("cable-{:03}", index)
}

fn placeholder_name(index: usize) -> String {
    format!("Cable {:03}", index)
}

/// Builds the GeoJSON feature for a draft. `index` is 1-based and must be
/// unique within a collection.
pub fn assemble(draft: CableDraft, index: usize, install_date: NaiveDate) -> Result<Feature> {
    let id = cable_id(index);
    let name = draft
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| placeholder_name(index));
    let properties = CableProperties {
        id: id.clone(),
        soil_type: draft.soil_type,
        depth: draft.soil_type.depth(),
        name,
        install_date: install_date.format("%Y-%m-%d").to_string(),
        style: draft.style,
        segments: draft.segments,
        total_distance: draft.total_distance,
        metadata: draft.metadata,
    };
    let properties = match serde_json::to_value(&properties)? {
        serde_json::Value::Object(map) => map,
        other => {
            return Err(KmlCableError::GeoJson(format!(
                "properties serialized to {}",
                other
            )));
        }
    };
    Ok(Feature {
        bbox: None,
        geometry: Some(draft.geometry.to_geojson()),
        id: Some(Id::String(id)),
        properties: Some(properties),
        foreign_members: None,
    })
}

/// Reads a string property from a feature.
pub fn string_property<'f>(properties: Option<&'f JsonObject>, key: &str) -> Option<&'f str> {
    properties?.get(key)?.as_str()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geodesy;
    use geo::{Coord, LineString};

    fn draft(name: Option<&str>, soil_type: SoilType) -> CableDraft {
        let coords = vec![Coord { x: 106.827, y: -6.175 }, Coord { x: 106.828, y: -6.176 }];
        CableDraft {
            segments: geodesy::segments(&coords),
            total_distance: geodesy::total_distance(&coords),
            geometry: CableGeometry::LineString(LineString::new(coords)),
            soil_type,
            name: name.map(str::to_string),
            style: None,
            metadata: BTreeMap::new(),
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    }

    #[test]
    fn test_cable_id() {
        assert_eq!(cable_id(1), "cable-001");
        assert_eq!(cable_id(7), "cable-007");
        assert_eq!(cable_id(42), "cable-042");
        assert_eq!(cable_id(1234), "cable-1234");
    }

    #[test]
    fn test_assemble_properties() {
        let feature = assemble(draft(Some("Jalur A"), SoilType::Pasir), 7, date()).unwrap();
        assert_eq!(feature.id, Some(Id::String("cable-007".to_string())));
        let props = CableProperties::from_feature(&feature).unwrap();
        assert_eq!(props.id, "cable-007");
        assert_eq!(props.name, "Jalur A");
        assert_eq!(props.soil_type, SoilType::Pasir);
        assert_eq!(props.depth, 1.5);
        assert_eq!(props.install_date, "2024-03-09");
        assert_eq!(props.segments.len(), 1);
        assert!(props.total_distance > 100.0 && props.total_distance < 200.0);

        let raw = feature.properties.as_ref().unwrap();
        assert_eq!(raw["soilType"], "Pasir");
        assert!(raw.contains_key("totalDistance"));
        assert!(!raw.contains_key("style"));
        assert!(!raw.contains_key("metadata"));
    }

    #[test]
    fn test_placeholder_name() {
        let feature = assemble(draft(None, SoilType::TanahLiat), 3, date()).unwrap();
        let props = CableProperties::from_feature(&feature).unwrap();
        assert_eq!(props.name, "Cable 003");
        assert_eq!(props.depth, 2.0);
        let feature = assemble(draft(Some("   "), SoilType::Batuan), 4, date()).unwrap();
        assert_eq!(string_property(feature.properties.as_ref(), "name"), Some("Cable 004"));
        assert_eq!(string_property(feature.properties.as_ref(), "soilType"), Some("Batuan"));
    }

    #[test]
    fn test_name_has_no_soil_suffix() {
        let feature = assemble(draft(Some("Route 9"), SoilType::Batuan), 1, date()).unwrap();
        assert_eq!(string_property(feature.properties.as_ref(), "name"), Some("Route 9"));
    }
}
