use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::NaiveDate;
use geo::{BoundingRect, LineString};
use geojson::{Feature, FeatureCollection, GeoJson};

use crate::classify::{self, SoilType};
use crate::document::{self, Element};
use crate::error::{KmlCableError, Result};
use crate::feature::{self, CableDraft};
use crate::geodesy;
use crate::geometry::{CableGeometry, RawCoordinate};
use crate::style::{self, StyleRecord};
use crate::validate;

/// Result of one conversion run.
#[derive(Clone, Debug)]
pub struct Conversion {
    pub collection: FeatureCollection,
    /// Placemarks or features left out for lack of a usable geometry.
    pub skipped: usize,
    /// Sum of `totalDistance` over all features, meters.
    pub total_distance: f64,
}

impl Conversion {
    pub fn len(&self) -> usize {
        self.collection.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collection.features.is_empty()
    }
}

/// Converts KML documents into cable route feature collections.
///
/// A converter holds no state between runs; the style table and the id
/// counter live inside each call.
#[derive(Clone, Debug)]
pub struct Converter {
    install_date: NaiveDate,
}

impl Converter {
    pub fn new(install_date: NaiveDate) -> Self {
        Self { install_date }
    }

    pub fn today() -> Self {
        Self::new(chrono::Local::now().date_naive())
    }

    pub fn convert(&self, kml: &str) -> Result<Conversion> {
        self.run(kml, None)
    }

    /// Like [`Converter::convert`], checking `cancel` before every placemark.
    pub fn convert_cancellable(&self, kml: &str, cancel: &AtomicBool) -> Result<Conversion> {
        self.run(kml, Some(cancel))
    }

    fn run(&self, kml: &str, cancel: Option<&AtomicBool>) -> Result<Conversion> {
        let doc = document::parse(kml)?;
        let root = doc.root();
        let styles = style::resolve_styles(root);
        log::debug!("resolved {} styles", styles.len());

        let mut builder = CollectionBuilder::new(self.install_date);
        for placemark in root.elements_by_tag_name("Placemark") {
            if cancel.is_some_and(|c| c.load(Ordering::Relaxed)) {
                return Err(KmlCableError::Cancelled);
            }
            let name = placemark.child_text("name");
            let Some(geometry) = crate::geometry::extract_geometry(placemark) else {
                log::debug!("skipping placemark {:?}: no usable line", name);
                builder.skip();
                continue;
            };
            let style = style::inline_style(placemark).or_else(|| {
                let url = placemark.child_text("styleUrl")?;
                styles.lookup(&url).cloned()
            });
            builder.push(
                geometry,
                name,
                placemark.child_text("description"),
                style,
                metadata(placemark),
            )?;
        }
        builder.finish()
    }

    /// Re-derives cable features from an already ingested GeoJSON
    /// FeatureCollection. `LineString` and `Point` features are kept and
    /// classified from their `name`, `description` and `style.lineColor`
    /// properties; everything else is skipped.
    pub fn convert_geojson(&self, text: &str) -> Result<Conversion> {
        let geojson: GeoJson = text
            .parse()
            .map_err(|e: geojson::Error| KmlCableError::GeoJson(e.to_string()))?;
        let GeoJson::FeatureCollection(input) = geojson else {
            return Err(KmlCableError::GeoJson(
                "expected a FeatureCollection".to_string(),
            ));
        };

        let mut builder = CollectionBuilder::new(self.install_date);
        for f in &input.features {
            let Some(geometry) = f.geometry.as_ref().and_then(CableGeometry::from_geojson) else {
                builder.skip();
                continue;
            };
            let props = f.properties.as_ref();
            let style = props
                .and_then(|p| p.get("style"))
                .and_then(|s| serde_json::from_value::<StyleRecord>(s.clone()).ok());
            let metadata: BTreeMap<String, String> = props
                .and_then(|p| p.get("metadata"))
                .and_then(|m| m.as_object())
                .map(|m| {
                    m.iter()
                        .filter_map(|(k, v)| Some((k.clone(), v.as_str()?.to_string())))
                        .collect()
                })
                .unwrap_or_default();
            builder.push(
                geometry,
                feature::string_property(props, "name").map(str::to_string),
                feature::string_property(props, "description").map(str::to_string),
                style,
                metadata,
            )?;
        }
        builder.finish()
    }
}

/// Accumulates features in document order and hands out contiguous ids.
struct CollectionBuilder {
    install_date: NaiveDate,
    features: Vec<Feature>,
    coords: Vec<RawCoordinate>,
    skipped: usize,
    total_distance: f64,
}

impl CollectionBuilder {
    fn new(install_date: NaiveDate) -> Self {
        Self {
            install_date,
            features: Vec::new(),
            coords: Vec::new(),
            skipped: 0,
            total_distance: 0.0,
        }
    }

    fn skip(&mut self) {
        self.skipped += 1;
    }

    fn push(
        &mut self,
        geometry: CableGeometry,
        name: Option<String>,
        description: Option<String>,
        style: Option<StyleRecord>,
        metadata: BTreeMap<String, String>,
    ) -> Result<()> {
        let (soil_type, basis) = classify::classify_with_basis(
            name.as_deref().unwrap_or(""),
            description.as_deref(),
            style.as_ref(),
        );
        log::trace!("{:?}: {} by {:?}", name, soil_type, basis);

        let coords = geometry.coords();
        let total_distance = geodesy::total_distance(&coords);
        let draft = CableDraft {
            segments: geodesy::segments(&coords),
            total_distance,
            geometry,
            soil_type,
            name,
            style,
            metadata,
        };
        let feature = feature::assemble(draft, self.features.len() + 1, self.install_date)?;
        self.features.push(feature);
        self.coords.extend(coords);
        self.total_distance += total_distance;
        Ok(())
    }

    fn finish(self) -> Result<Conversion> {
        let bbox = LineString::new(self.coords)
            .bounding_rect()
            .map(|r| vec![r.min().x, r.min().y, r.max().x, r.max().y]);
        let collection = FeatureCollection {
            bbox,
            features: self.features,
            foreign_members: None,
        };
        validate::validate_collection(&serde_json::to_value(&collection)?)?;
        log::info!(
            "converted {} features ({} skipped), {:.1} m of cable",
            collection.features.len(),
            self.skipped,
            self.total_distance
        );
        Ok(Conversion {
            collection,
            skipped: self.skipped,
            total_distance: self.total_distance,
        })
    }
}

/// Collects the descriptive placemark fields and `ExtendedData` entries
/// into a flat string map. An `ExtendedData` entry replaces a placemark
/// field with the same key.
pub fn metadata<'a, E: Element<'a>>(placemark: E) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for (tag, key) in [
        ("description", "description"),
        ("visibility", "visibility"),
        ("open", "open"),
        ("Snippet", "snippet"),
    ] {
        if let Some(value) = placemark.child_text(tag) {
            map.insert(key.to_string(), value);
        }
    }
    if let Some(when) = placemark
        .child("TimeStamp")
        .and_then(|t| t.child_text("when"))
    {
        map.insert("timestamp".to_string(), when);
    }
    if let Some(extended) = placemark.child("ExtendedData") {
        for data in extended.elements_by_tag_name("Data") {
            if let (Some(key), Some(value)) = (data.attribute("name"), data.child_text("value")) {
                map.insert(key.to_string(), value);
            }
        }
        for data in extended.elements_by_tag_name("SimpleData") {
            let value = data.text_content();
            let value = value.trim();
            if let Some(key) = data.attribute("name").filter(|_| !value.is_empty()) {
                map.insert(key.to_string(), value.to_string());
            }
        }
    }
    map
}

/// Soil type counts for a converted collection.
pub fn soil_summary(collection: &FeatureCollection) -> BTreeMap<&'static str, usize> {
    let mut counts = BTreeMap::new();
    for f in &collection.features {
        let soil = feature::string_property(f.properties.as_ref(), "soilType")
            .and_then(SoilType::from_name);
        if let Some(soil) = soil {
            *counts.entry(soil.as_str()).or_insert(0) += 1;
        }
    }
    counts
}
