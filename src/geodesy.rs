//! Spherical-earth distance and bearing.

use geo::{Bearing, Distance, Haversine, HaversineMeasure, Point};
use serde::{Deserialize, Serialize};

use crate::geometry::RawCoordinate;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS: f64 = 6_371_000.0;

/// One leg of a route between two consecutive coordinates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentInfo {
    /// `[lon, lat]`
    pub start_point: [f64; 2],
    pub end_point: [f64; 2],
    /// Meters.
    pub distance: f64,
    /// Degrees clockwise from north, in `[0, 360)`.
    pub bearing: f64,
}

fn finite(a: &RawCoordinate, b: &RawCoordinate) -> bool {
    [a.x, a.y, b.x, b.y].iter().all(|v| v.is_finite())
}

/// Great-circle distance in meters. Returns 0 for non-finite input.
pub fn haversine_distance(a: &RawCoordinate, b: &RawCoordinate) -> f64 {
    if !finite(a, b) {
        log::warn!("haversine: non-finite input {:?} -> {:?}", a, b);
        return 0.0;
    }
    HaversineMeasure::new(EARTH_RADIUS).distance(Point::from(*a), Point::from(*b))
}

/// Initial great-circle bearing from `a` to `b` in degrees, in `[0, 360)`.
/// Returns 0 for non-finite input.
pub fn initial_bearing(a: &RawCoordinate, b: &RawCoordinate) -> f64 {
    if !finite(a, b) {
        log::warn!("bearing: non-finite input {:?} -> {:?}", a, b);
        return 0.0;
    }
    Haversine.bearing(Point::from(*a), Point::from(*b))
}

pub fn segments(coords: &[RawCoordinate]) -> Vec<SegmentInfo> {
    coords
        .windows(2)
        .map(|w| SegmentInfo {
            start_point: [w[0].x, w[0].y],
            end_point: [w[1].x, w[1].y],
            distance: haversine_distance(&w[0], &w[1]),
            bearing: initial_bearing(&w[0], &w[1]),
        })
        .collect()
}

/// Sum of the leg distances, 0 for fewer than two coordinates.
pub fn total_distance(coords: &[RawCoordinate]) -> f64 {
    coords
        .windows(2)
        .map(|w| haversine_distance(&w[0], &w[1]))
        .sum()
}
