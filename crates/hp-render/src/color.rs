//! RGBA color and the builtin sample palettes.

use serde::Deserialize;
use std::fmt;

/// RGBA color. Alpha is a fraction in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Parse `#rrggbb` (leading `#` optional). Malformed components read as 0.
    pub fn hex(s: &str) -> Self {
        let s = s.strip_prefix('#').unwrap_or(s);
        let byte = |r: std::ops::Range<usize>| {
            s.get(r).and_then(|t| u8::from_str_radix(t, 16).ok()).unwrap_or(0)
        };
        Self { r: byte(0..2), g: byte(2..4), b: byte(4..6), a: 1.0 }
    }

    pub const fn with_alpha(mut self, a: f64) -> Self {
        self.a = a;
        self
    }

    /// SVG fill/stroke attribute value.
    pub fn to_svg(&self) -> String {
        if (self.a - 1.0).abs() < 1e-6 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("rgba({},{},{},{:.3})", self.r, self.g, self.b, self.a)
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_svg())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Color::hex(&s))
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::rgb(0, 0, 0)
    }
}

// --- Palettes ---

/// Default stack palette.
pub const HEP_DEFAULT: &[&str] = &[
    "#4C78A8", "#F58518", "#54A24B", "#E45756", "#72B7B2", "#EECA3B", "#B279A2", "#FF9DA6",
    "#9D755D", "#BAB0AC",
];

/// Wong color-blind-safe palette (ATLAS recommendation).
pub const ATLAS_WONG: &[&str] =
    &["#0072b2", "#d55e00", "#56b4e9", "#e69f00", "#f0e442", "#009e73", "#cc79a7"];

/// Petroff 6-color palette (CMS recommendation).
pub const CMS_PETROFF6: &[&str] =
    &["#5790fc", "#f89c20", "#e42536", "#964a8b", "#9c9ca1", "#7a21dd"];

/// Resolve a palette by name; unknown names fall back to the default.
pub fn palette_colors(name: &str) -> Vec<Color> {
    let strs = match name {
        "atlas_wong" => ATLAS_WONG,
        "cms_petroff6" => CMS_PETROFF6,
        _ => HEP_DEFAULT,
    };
    strs.iter().map(|s| Color::hex(s)).collect()
}
