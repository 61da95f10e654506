use geo::{Coord, LineString};
use geojson::{Geometry as GeoJsonGeometry, Value as GeoJsonValue};

use crate::document::Element;

/// A `[longitude, latitude]` pair. `x` is longitude, `y` latitude.
pub type RawCoordinate = Coord<f64>;

#[derive(Clone, Debug, PartialEq)]
pub enum CableGeometry {
    LineString(LineString<f64>),
    Point(RawCoordinate),
}

impl CableGeometry {
    pub fn coords(&self) -> Vec<RawCoordinate> {
        match self {
            CableGeometry::LineString(ls) => ls.0.clone(),
            CableGeometry::Point(c) => vec![*c],
        }
    }

    pub fn point_count(&self) -> usize {
        match self {
            CableGeometry::LineString(ls) => ls.0.len(),
            CableGeometry::Point(_) => 1,
        }
    }

    pub fn to_geojson(&self) -> GeoJsonGeometry {
        match self {
            CableGeometry::LineString(ls) => GeoJsonGeometry::new(GeoJsonValue::LineString(
                ls.coords().map(|c| vec![c.x, c.y]).collect(),
            )),
            CableGeometry::Point(c) => GeoJsonGeometry::new(GeoJsonValue::Point(vec![c.x, c.y])),
        }
    }

    /// Reads a geometry from an already ingested GeoJSON feature. Only
    /// `LineString` (two or more valid positions) and `Point` are kept.
    pub fn from_geojson(geometry: &GeoJsonGeometry) -> Option<Self> {
        match &geometry.value {
            GeoJsonValue::LineString(positions) => {
                let coords: Vec<RawCoordinate> =
                    positions.iter().filter_map(|p| position(p)).collect();
                if coords.len() < 2 {
                    return None;
                }
                Some(CableGeometry::LineString(LineString::new(coords)))
            }
            GeoJsonValue::Point(p) => position(p).map(CableGeometry::Point),
            _ => None,
        }
    }
}

fn position(p: &[f64]) -> Option<RawCoordinate> {
    if p.len() < 2 || !p[0].is_finite() || !p[1].is_finite() {
        return None;
    }
    Some(Coord { x: p[0], y: p[1] })
}

/// Parses a KML `<coordinates>` string: whitespace separated tuples of
/// `lon,lat[,alt]`. Tuples that do not yield two finite numbers are dropped.
pub fn parse_coordinates(text: &str) -> Vec<RawCoordinate> {
    text.split_whitespace()
        .filter_map(|token| {
            let coord = parse_tuple(token);
            if coord.is_none() {
                log::debug!("dropping invalid coordinate {:?}", token);
            }
            coord
        })
        .collect()
}

fn parse_tuple(token: &str) -> Option<RawCoordinate> {
    let mut parts = token.split(',');
    let lon = parts.next()?.trim().parse::<f64>().ok()?;
    let lat = parts.next()?.trim().parse::<f64>().ok()?;
    if !lon.is_finite() || !lat.is_finite() {
        return None;
    }
    Some(Coord { x: lon, y: lat })
}

/// Pulls the first `LineString` out of a placemark, looking through nested
/// containers such as `MultiGeometry`. Returns `None` when the placemark has
/// no line or fewer than two valid coordinates; callers skip it.
pub fn extract_geometry<'a, E: Element<'a>>(placemark: E) -> Option<CableGeometry> {
    let line = placemark
        .elements_by_tag_name("LineString")
        .into_iter()
        .next()?;
    let text = line
        .child("coordinates")
        .map(|c| c.text_content())
        .unwrap_or_default();
    let coords = parse_coordinates(&text);
    if coords.len() < 2 {
        log::debug!("line string has {} valid coordinates", coords.len());
        return None;
    }
    Some(CableGeometry::LineString(LineString::new(coords)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document;

    #[test]
    fn test_parse_coordinates() {
        let coords = parse_coordinates(
            "\n  106.827,-6.175,0 106.828,-6.176\n\t106.829,-6.177,12.5  ",
        );
        assert_eq!(coords.len(), 3);
        assert_eq!(coords[0], Coord { x: 106.827, y: -6.175 });
        assert_eq!(coords[2], Coord { x: 106.829, y: -6.177 });
    }

    #[test]
    fn test_invalid_tokens_dropped() {
        let coords = parse_coordinates("1,2 abc,3 4 5,x NaN,1 1,inf 6,7");
        assert_eq!(coords, vec![Coord { x: 1.0, y: 2.0 }, Coord { x: 6.0, y: 7.0 }]);
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse_coordinates("").is_empty());
        assert!(parse_coordinates("   ").is_empty());
    }

    fn extract(kml: &str) -> Option<CableGeometry> {
        let doc = document::parse(kml).unwrap();
        extract_geometry(doc.root_element())
    }

    #[test]
    fn test_extract_line_string() {
        let g = extract(
            "<Placemark><LineString><coordinates>106.827,-6.175 106.828,-6.176</coordinates></LineString></Placemark>",
        )
        .unwrap();
        assert_eq!(g.point_count(), 2);
        match g.to_geojson().value {
            GeoJsonValue::LineString(c) => assert_eq!(c[1], vec![106.828, -6.176]),
            _ => panic!("Expected LineString"),
        }
    }

    #[test]
    fn test_extract_from_multigeometry() {
        let g = extract(
            "<Placemark><MultiGeometry><Point><coordinates>1,1</coordinates></Point>\
             <LineString><coordinates>1,1 2,2 3,3</coordinates></LineString></MultiGeometry></Placemark>",
        );
        assert_eq!(g.map(|g| g.point_count()), Some(3));
    }

    #[test]
    fn test_single_coordinate_is_skipped() {
        assert!(extract("<Placemark><LineString><coordinates>1,1</coordinates></LineString></Placemark>").is_none());
        assert!(extract("<Placemark><LineString><coordinates>1,1 x,y</coordinates></LineString></Placemark>").is_none());
    }

    #[test]
    fn test_no_line_string() {
        assert!(extract("<Placemark><Point><coordinates>1,1</coordinates></Point></Placemark>").is_none());
        assert!(extract("<Placemark><LineString/></Placemark>").is_none());
    }

    #[test]
    fn test_from_geojson() {
        let line = GeoJsonGeometry::new(GeoJsonValue::LineString(vec![
            vec![0.0, 0.0],
            vec![1.0],
            vec![1.0, 1.0],
        ]));
        assert_eq!(CableGeometry::from_geojson(&line).map(|g| g.point_count()), Some(2));

        let short = GeoJsonGeometry::new(GeoJsonValue::LineString(vec![vec![0.0, 0.0]]));
        assert!(CableGeometry::from_geojson(&short).is_none());

        let point = GeoJsonGeometry::new(GeoJsonValue::Point(vec![3.0, 4.0, 5.0]));
        assert_eq!(
            CableGeometry::from_geojson(&point),
            Some(CableGeometry::Point(Coord { x: 3.0, y: 4.0 }))
        );

        let polygon = GeoJsonGeometry::new(GeoJsonValue::Polygon(vec![]));
        assert!(CableGeometry::from_geojson(&polygon).is_none());
    }
}
