//! Color values.
//!
//! [`Color`] is what the content stream interpreter tracks: floating-point
//! components in `[0.0, 1.0]`, already converted to RGB. [`Rgb`] is the
//! normalized, packed form the model stores in its palette.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Simple RGB color with components in `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    pub fn black() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub fn gray(level: f64) -> Self {
        Self::new(level, level, level)
    }

    /// Naive CMYK conversion. Device-independent color is out of scope.
    pub fn from_cmyk(c: f64, m: f64, y: f64, k: f64) -> Self {
        Self::new(
            (1.0 - c) * (1.0 - k),
            (1.0 - m) * (1.0 - k),
            (1.0 - y) * (1.0 - k),
        )
    }

    /// Build a color from 1 (gray), 3 (RGB) or 4 (CMYK) components.
    pub fn from_components(components: &[f64]) -> Option<Self> {
        match components {
            [g] => Some(Self::gray(*g)),
            [r, g, b] => Some(Self::new(*r, *g, *b)),
            [c, m, y, k] => Some(Self::from_cmyk(*c, *m, *y, *k)),
            _ => None,
        }
    }

    /// Quantize to 8 bits per channel.
    pub fn to_rgb(self) -> Rgb {
        fn channel(v: f64) -> u32 {
            (v.clamp(0.0, 1.0) * 255.0).round() as u32
        }
        Rgb((channel(self.r) << 16) | (channel(self.g) << 8) | channel(self.b))
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

/// A packed 24-bit sRGB color, `0xRRGGBB`.
///
/// This is the normalized representation palette lookups compare on.
/// On the wire it is written as `"#rrggbb"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Rgb(pub u32);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0x000000);
    pub const WHITE: Rgb = Rgb(0xFFFFFF);

    pub fn from_bytes(r: u8, g: u8, b: u8) -> Self {
        Rgb(((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    pub fn red(self) -> u8 {
        ((self.0 >> 16) & 0xFF) as u8
    }

    pub fn green(self) -> u8 {
        ((self.0 >> 8) & 0xFF) as u8
    }

    pub fn blue(self) -> u8 {
        (self.0 & 0xFF) as u8
    }

    /// Components as fractions, ready for `rg`/`RG` operands.
    pub fn components(self) -> [f32; 3] {
        [
            self.red() as f32 / 255.0,
            self.green() as f32 / 255.0,
            self.blue() as f32 / 255.0,
        ]
    }
}

impl From<Color> for Rgb {
    fn from(color: Color) -> Self {
        color.to_rgb()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.0 & 0xFF_FFFF)
    }
}

/// Error returned when parsing an [`Rgb`] from text fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRgbError(pub String);

impl fmt::Display for ParseRgbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid color {:?}: expected \"#rrggbb\"", self.0)
    }
}

impl std::error::Error for ParseRgbError {}

impl FromStr for Rgb {
    type Err = ParseRgbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 {
            return Err(ParseRgbError(s.to_string()));
        }
        u32::from_str_radix(hex, 16)
            .map(Rgb)
            .map_err(|_| ParseRgbError(s.to_string()))
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
