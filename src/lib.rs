//! KML cable route conversion.
//!
//! Reads KML placemarks, resolves their styles, classifies each route's soil
//! type and measures it, and emits a GeoJSON `FeatureCollection` of cables.

pub mod classify;
pub mod color;
pub mod convert;
pub mod document;
pub mod error;
pub mod feature;
pub mod geodesy;
pub mod geometry;
pub mod store;
pub mod style;
pub mod validate;

pub use classify::{SoilType, classify};
pub use convert::{Conversion, Converter};
pub use error::{KmlCableError, Result};
pub use feature::CableProperties;
pub use geodesy::{SegmentInfo, haversine_distance, initial_bearing, segments, total_distance};
pub use store::{FeatureStore, FileStore, MemoryStore};
pub use style::{StyleRecord, StyleTable, resolve_styles};
