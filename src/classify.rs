use core::fmt;

use serde::{Deserialize, Serialize};

use crate::color::Rgba;
use crate::style::StyleRecord;

/// Soil category along a cable route. Determines burial depth.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoilType {
    Pasir,
    #[serde(rename = "Tanah Liat")]
    TanahLiat,
    Batuan,
}

impl SoilType {
    pub const ALL: [SoilType; 3] = [SoilType::Pasir, SoilType::TanahLiat, SoilType::Batuan];

    /// Installation depth in meters.
    pub fn depth(&self) -> f64 {
        match self {
            SoilType::Pasir => 1.5,
            SoilType::TanahLiat => 2.0,
            SoilType::Batuan => 2.5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SoilType::Pasir => "Pasir",
            SoilType::TanahLiat => "Tanah Liat",
            SoilType::Batuan => "Batuan",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        SoilType::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

impl fmt::Display for SoilType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which rule decided a classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Basis {
    Name,
    Description,
    Color,
    Default,
}

/// Classifies a route by, in order: keywords in its name, keywords in its
/// description, the proximity of its line color to a reference hue, and
/// finally a `Tanah Liat` default. The first tier that matches wins.
pub fn classify(name: &str, description: Option<&str>, style: Option<&StyleRecord>) -> SoilType {
    classify_with_basis(name, description, style).0
}

pub fn classify_with_basis(
    name: &str,
    description: Option<&str>,
    style: Option<&StyleRecord>,
) -> (SoilType, Basis) {
    if let Some(soil) = keyword_match(name) {
        return (soil, Basis::Name);
    }
    if let Some(soil) = description.and_then(keyword_match) {
        return (soil, Basis::Description);
    }
    if let Some(soil) = style.and_then(StyleRecord::line_rgba).and_then(color_match) {
        return (soil, Basis::Color);
    }
    (SoilType::TanahLiat, Basis::Default)
}

fn keyword_match(text: &str) -> Option<SoilType> {
    let text = text.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| text.contains(w));
    if has(&["pasir", "sand"]) {
        return Some(SoilType::Pasir);
    }
    if has(&["batuan", "batu", "rock"]) {
        return Some(SoilType::Batuan);
    }
    if has(&["tanah liat", "clay", "liat"]) {
        return Some(SoilType::TanahLiat);
    }
    let whole_word_tanah = text
        .split(|c: char| !c.is_alphanumeric())
        .any(|w| w == "tanah");
    if whole_word_tanah && !text.contains("batuan") {
        return Some(SoilType::TanahLiat);
    }
    None
}

fn color_match(c: Rgba) -> Option<SoilType> {
    let (r, g, b) = (c.r as i32, c.g as i32, c.b as i32);
    if r > 200 && g > 180 && b < 100 {
        return Some(SoilType::Pasir);
    }
    if r > 180 && g < 100 && b < 100 {
        return Some(SoilType::TanahLiat);
    }
    let spread = (r - g).abs().max((g - b).abs()).max((r - b).abs());
    if spread < 50 && r < 150 {
        return Some(SoilType::Batuan);
    }
    None
}
