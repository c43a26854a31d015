//! The edit-friendly document model and its wire format.
//!
//! A [`Document`] is what extraction produces and reconstruction consumes.
//! Field names on the wire follow the published record layout
//! (`colorPalette`, `colorIndex`, `fontName`, ...), so the model can be
//! handed to an editor as JSON and read back unchanged.
//!
//! Colors are never stored inline: every element carries an index into the
//! document's [`ColorPalette`]. Text style, on the other hand, is stored
//! inline on each [`StyledSpan`]; the page [`StylePalette`] is a summary.

use serde::{Deserialize, Serialize};

use crate::palette::{ColorPalette, StylePalette};

/// An extracted document: pages plus the shared color palette.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    pub pages: Vec<Page>,
    #[serde(rename = "colorPalette")]
    pub color_palette: ColorPalette,
}

impl Document {
    /// Total number of text runs, images, lines, and fills across all pages.
    pub fn element_count(&self) -> usize {
        self.pages.iter().map(Page::element_count).sum()
    }
}

/// One page of a [`Document`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// 1-based page number.
    pub page_number: u32,
    /// Page width in points.
    pub width: f64,
    /// Page height in points.
    pub height: f64,
    pub texts: Vec<TextRun>,
    pub images: Vec<Image>,
    pub hlines: Vec<HLine>,
    pub vlines: Vec<VLine>,
    pub fills: Vec<Fill>,
    /// Reserved for form fields. Always empty.
    #[serde(default)]
    pub fields: Vec<serde_json::Value>,
    /// Reserved for checkbox-like widgets. Always empty.
    #[serde(default)]
    pub boxsets: Vec<serde_json::Value>,
    /// Distinct styles used on this page. Informational only.
    #[serde(rename = "stylePalette", default)]
    pub style_palette: StylePalette,
}

impl Page {
    /// An empty page with the given number and size.
    pub fn new(page_number: u32, width: f64, height: f64) -> Self {
        Self {
            page_number,
            width,
            height,
            texts: Vec::new(),
            images: Vec::new(),
            hlines: Vec::new(),
            vlines: Vec::new(),
            fills: Vec::new(),
            fields: Vec::new(),
            boxsets: Vec::new(),
            style_palette: StylePalette::new(),
        }
    }

    pub fn element_count(&self) -> usize {
        self.texts.len() + self.images.len() + self.hlines.len() + self.vlines.len() + self.fills.len()
    }

    /// Every color index referenced on this page, in element order.
    pub fn color_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.texts
            .iter()
            .map(|t| t.color_index)
            .chain(self.hlines.iter().map(|l| l.color_index))
            .chain(self.vlines.iter().map(|l| l.color_index))
            .chain(self.fills.iter().map(|f| f.color_index))
    }
}

/// Horizontal alignment of a text run within its box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// A positioned piece of text made of one or more styled spans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    /// Left edge of the bounding box.
    pub x: f64,
    /// Top edge of the bounding box.
    pub y: f64,
    /// Width of the bounding box.
    pub w: f64,
    #[serde(rename = "colorIndex")]
    pub color_index: usize,
    #[serde(default)]
    pub align: Align,
    pub runs: Vec<StyledSpan>,
}

impl TextRun {
    /// Concatenated text of all spans.
    pub fn text(&self) -> String {
        self.runs.iter().map(|s| s.text.as_str()).collect()
    }
}

/// Normalized `(font, size, bold, italic)` descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleTuple {
    #[serde(rename = "fontName")]
    pub font_name: String,
    pub size: f64,
    pub bold: bool,
    pub italic: bool,
}

impl StyleTuple {
    pub fn new(font_name: impl Into<String>, size: f64, bold: bool, italic: bool) -> Self {
        Self {
            font_name: font_name.into(),
            size,
            bold,
            italic,
        }
    }
}

/// Value of [`StyledSpan::flags`] when no decoration applies.
pub const NO_DECORATION: &str = "none";

fn no_decoration() -> String {
    NO_DECORATION.to_string()
}

/// Text sharing one inline style. `text` may be empty; consumers skip those.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyledSpan {
    pub text: String,
    pub style: StyleTuple,
    /// Reserved for inline decorations such as underline.
    #[serde(default = "no_decoration")]
    pub flags: String,
}

impl StyledSpan {
    pub fn new(text: impl Into<String>, style: StyleTuple) -> Self {
        Self {
            text: text.into(),
            style,
            flags: no_decoration(),
        }
    }
}

/// A horizontal stroke at fixed `y`, running right from `x`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HLine {
    pub x: f64,
    pub y: f64,
    pub length: f64,
    /// Stroke width.
    pub width: f64,
    #[serde(rename = "colorIndex")]
    pub color_index: usize,
    #[serde(default)]
    pub dashed: bool,
}

/// A vertical stroke at fixed `x`, running down from `y`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VLine {
    pub x: f64,
    pub y: f64,
    pub length: f64,
    /// Stroke width.
    pub width: f64,
    #[serde(rename = "colorIndex")]
    pub color_index: usize,
    #[serde(default)]
    pub dashed: bool,
}

/// An axis-aligned filled rectangle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    #[serde(rename = "colorIndex")]
    pub color_index: usize,
}

/// Where an image sits on the page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

/// A raster image and its encoded bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    /// Engine-specific reference to the image source. Not stable across
    /// re-extraction; do not persist it.
    #[serde(rename = "sourceRef")]
    pub source_ref: String,
    /// Encoding of `bytes` (`png`, `jpeg`, `jpx`, `bin`).
    pub ext: String,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    #[serde(with = "base64_bytes")]
    pub bytes: Vec<u8>,
    /// Placement on the page. Reconstruction skips images without one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Placement>,
}

/// Serde adapter writing byte buffers as standard base64 strings.
mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(s.as_bytes()).map_err(serde::de::Error::custom)
    }
}
