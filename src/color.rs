use core::fmt;
use std::str::FromStr;

/// An RGBA color. Channels are bytes, alpha is normalized to `[0, 1]` and
/// rounded to two decimals.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    /// Decodes a KML `<color>` value: eight hex digits in `AABBGGRR` order.
    pub fn from_kml_abgr(s: &str) -> Option<Self> {
        let s = s.trim();
        let s = s.strip_prefix('#').unwrap_or(s);
        if s.len() != 8 || !s.bytes().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let byte = |i: usize| u8::from_str_radix(&s[i..i + 2], 16).ok();
        let alpha = byte(0)?;
        Some(Rgba {
            r: byte(6)?,
            g: byte(4)?,
            b: byte(2)?,
            a: round2(alpha as f64 / 255.0),
        })
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({},{},{},{:.2})", self.r, self.g, self.b, self.a)
    }
}

#[derive(Debug, PartialEq)]
pub struct ParseColorError(String);

impl fmt::Display for ParseColorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid rgba color: {}", self.0)
    }
}

impl std::error::Error for ParseColorError {}

/// Reads back the `rgba(R,G,B,A)` form produced by `Display`. Whitespace
/// around the components is tolerated.
impl FromStr for Rgba {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseColorError(s.to_string());
        let inner = s
            .trim()
            .strip_prefix("rgba(")
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(err)?;
        let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(err());
        }
        let channel = |p: &str| p.parse::<u8>().map_err(|_| err());
        let a = parts[3].parse::<f64>().map_err(|_| err())?;
        if !(0.0..=1.0).contains(&a) {
            return Err(err());
        }
        Ok(Rgba {
            r: channel(parts[0])?,
            g: channel(parts[1])?,
            b: channel(parts[2])?,
            a,
        })
    }
}
