use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::color::Rgba;
use crate::document::Element;

/// Visual style resolved for one KML style id. Every field is optional:
/// `None` means the KML did not specify it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub polygon_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub polygon_opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_href: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_scale: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_scale: Option<f64>,
}

impl StyleRecord {
    pub fn line_rgba(&self) -> Option<Rgba> {
        self.line_color.as_deref()?.parse().ok()
    }

    /// Reads the `LineStyle`, `PolyStyle`, `IconStyle` and `LabelStyle`
    /// children of a `<Style>` element.
    pub fn from_element<'a, E: Element<'a>>(style: E) -> Self {
        let mut record = StyleRecord::default();
        if let Some(line) = style.child("LineStyle") {
            if let Some(c) = read_color(line) {
                record.line_color = Some(c.to_string());
                record.line_opacity = Some(c.a);
            }
            record.line_width = read_number(line, "width");
        }
        if let Some(poly) = style.child("PolyStyle") {
            if let Some(c) = read_color(poly) {
                record.polygon_color = Some(c.to_string());
                record.polygon_opacity = Some(c.a);
            }
        }
        if let Some(icon) = style.child("IconStyle") {
            record.icon_color = read_color(icon).map(|c| c.to_string());
            record.icon_scale = read_number(icon, "scale");
            record.icon_href = icon.child("Icon").and_then(|i| i.child_text("href"));
        }
        if let Some(label) = style.child("LabelStyle") {
            record.label_color = read_color(label).map(|c| c.to_string());
            record.label_scale = read_number(label, "scale");
        }
        record
    }
}

fn read_color<'a, E: Element<'a>>(e: E) -> Option<Rgba> {
    let text = e.child_text("color")?;
    let color = Rgba::from_kml_abgr(&text);
    if color.is_none() {
        log::debug!("ignoring malformed color {:?}", text);
    }
    color
}

fn read_number<'a, E: Element<'a>>(e: E, tag: &str) -> Option<f64> {
    e.child_text(tag)?
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Style id to resolved record, built once per conversion.
#[derive(Clone, Debug, Default)]
pub struct StyleTable {
    styles: HashMap<String, StyleRecord>,
}

impl StyleTable {
    pub fn get(&self, id: &str) -> Option<&StyleRecord> {
        self.styles.get(id)
    }

    /// Resolves a `styleUrl` value. `#id`, `other.kml#id` and `id` all
    /// refer to `id`.
    pub fn lookup(&self, style_url: &str) -> Option<&StyleRecord> {
        let id = style_url_id(style_url);
        let found = self.styles.get(id);
        if found.is_none() {
            log::debug!("style {:?} not found", style_url);
        }
        found
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}

fn style_url_id(style_url: &str) -> &str {
    let s = style_url.trim();
    match s.rfind('#') {
        Some(i) => &s[i + 1..],
        None => s,
    }
}

/// Builds the style table for a document: every `<Style id>` first, then
/// every `<StyleMap id>` bound to the record its `normal` pair points at.
///
/// When a map has no `normal` pair, the first pair that resolves wins.
/// Pairs only resolve against `<Style>` records, never against other maps.
pub fn resolve_styles<'a, E: Element<'a>>(root: E) -> StyleTable {
    let mut styles = HashMap::new();
    for style in root.elements_by_tag_name("Style") {
        if let Some(id) = style.attribute("id") {
            styles.insert(id.to_string(), StyleRecord::from_element(style));
        }
    }

    let mut aliases = Vec::new();
    for map in root.elements_by_tag_name("StyleMap") {
        let Some(id) = map.attribute("id") else {
            continue;
        };
        let pairs = map.children_named("Pair");
        let resolve = |pair: &E| -> Option<StyleRecord> {
            if let Some(inline) = pair.child("Style") {
                return Some(StyleRecord::from_element(inline));
            }
            let url = pair.child_text("styleUrl")?;
            styles.get(style_url_id(&url)).cloned()
        };
        let normal = pairs
            .iter()
            .find(|p| p.child_text("key").as_deref() == Some("normal"));
        let record = match normal {
            Some(pair) => resolve(pair),
            None => pairs.iter().find_map(resolve),
        };
        match record {
            Some(record) => aliases.push((id.to_string(), record)),
            None => log::debug!("style map {:?} does not resolve", id),
        }
    }
    styles.extend(aliases);

    StyleTable { styles }
}

/// The `<Style>` declared directly inside a placemark, if any.
pub fn inline_style<'a, E: Element<'a>>(placemark: E) -> Option<StyleRecord> {
    placemark.child("Style").map(StyleRecord::from_element)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document;

    const KML: &str = r##"<kml xmlns="http://www.opengis.net/kml/2.2"><Document>
  <Style id="sand">
    <LineStyle><color>ff2dc0fb</color><width>4</width></LineStyle>
    <PolyStyle><color>7f00ff00</color></PolyStyle>
    <IconStyle><color>ff0000ff</color><scale>1.1</scale><Icon><href>http://x/pin.png</href></Icon></IconStyle>
    <LabelStyle><scale>0.8</scale></LabelStyle>
  </Style>
  <Style id="sand-hl"><LineStyle><color>ffffffff</color></LineStyle></Style>
  <Style id="bare"/>
  <StyleMap id="m-normal">
    <Pair><key>highlight</key><styleUrl>#sand-hl</styleUrl></Pair>
    <Pair><key>normal</key><styleUrl>#sand</styleUrl></Pair>
  </StyleMap>
  <StyleMap id="m-fallback">
    <Pair><key>highlight</key><styleUrl>#missing</styleUrl></Pair>
    <Pair><key>hover</key><styleUrl>#sand-hl</styleUrl></Pair>
  </StyleMap>
  <StyleMap id="m-broken">
    <Pair><key>normal</key><styleUrl>#missing</styleUrl></Pair>
    <Pair><key>highlight</key><styleUrl>#sand</styleUrl></Pair>
  </StyleMap>
  <StyleMap id="m-chain">
    <Pair><key>normal</key><styleUrl>#m-normal</styleUrl></Pair>
  </StyleMap>
  <StyleMap id="m-inline">
    <Pair><key>normal</key><Style><LineStyle><color>ff000000</color></LineStyle></Style></Pair>
  </StyleMap>
</Document></kml>"##;

    fn table() -> StyleTable {
        let doc = document::parse(KML).unwrap();
        resolve_styles(doc.root())
    }

    #[test]
    fn test_style_fields() {
        let table = table();
        let sand = table.get("sand").unwrap();
        assert_eq!(sand.line_color.as_deref(), Some("rgba(251,192,45,1.00)"));
        assert_eq!(sand.line_opacity, Some(1.0));
        assert_eq!(sand.line_width, Some(4.0));
        assert_eq!(sand.polygon_color.as_deref(), Some("rgba(0,255,0,0.50)"));
        assert_eq!(sand.polygon_opacity, Some(0.5));
        assert_eq!(sand.icon_color.as_deref(), Some("rgba(255,0,0,1.00)"));
        assert_eq!(sand.icon_scale, Some(1.1));
        assert_eq!(sand.icon_href.as_deref(), Some("http://x/pin.png"));
        assert_eq!(sand.label_color, None);
        assert_eq!(sand.label_scale, Some(0.8));
    }

    #[test]
    fn test_missing_fields_stay_unspecified() {
        let table = table();
        assert_eq!(table.get("bare"), Some(&StyleRecord::default()));
        let json = serde_json::to_value(table.get("bare").unwrap()).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }

    #[test]
    fn test_style_map_prefers_normal() {
        let table = table();
        assert_eq!(table.get("m-normal"), table.get("sand"));
    }

    #[test]
    fn test_style_map_falls_back_to_first_resolved() {
        let table = table();
        assert_eq!(table.get("m-fallback"), table.get("sand-hl"));
    }

    #[test]
    fn test_style_map_unresolved_normal_is_not_bound() {
        let table = table();
        assert!(table.get("m-broken").is_none());
    }

    #[test]
    fn test_style_map_does_not_chain() {
        let table = table();
        assert!(table.get("m-chain").is_none());
    }

    #[test]
    fn test_style_map_inline_pair() {
        let table = table();
        let record = table.get("m-inline").unwrap();
        assert_eq!(record.line_color.as_deref(), Some("rgba(0,0,0,1.00)"));
    }

    #[test]
    fn test_lookup_url_forms() {
        let table = table();
        assert!(table.lookup("#sand").is_some());
        assert!(table.lookup("styles.kml#sand").is_some());
        assert!(table.lookup("sand").is_some());
        assert!(table.lookup("#nope").is_none());
    }

    #[test]
    fn test_inline_style() {
        let doc = document::parse(
            "<Placemark><Style><LineStyle><width>2.5</width></LineStyle></Style></Placemark>",
        )
        .unwrap();
        let record = inline_style(doc.root_element()).unwrap();
        assert_eq!(record.line_width, Some(2.5));
        assert_eq!(record.line_color, None);
    }

    #[test]
    fn test_malformed_color_ignored() {
        let doc = document::parse(
            r#"<kml><Style id="s"><LineStyle><color>red</color><width>x</width></LineStyle></Style></kml>"#,
        )
        .unwrap();
        let table = resolve_styles(doc.root());
        assert_eq!(table.get("s"), Some(&StyleRecord::default()));
    }
}
