//! Raw primitives as reported by a document engine.
//!
//! These are the engine's view of a page before classification. All
//! coordinates are already in top-left-origin page space.

use crate::color::Rgb;
use crate::geometry::{BBox, Point};

/// Engine style-flag bit: italic glyphs.
pub const FLAG_ITALIC: u32 = 1;
/// Engine style-flag bit: bold glyphs.
pub const FLAG_BOLD: u32 = 2;

/// A contiguous run of text sharing one font, size, and color.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSpan {
    pub bbox: BBox,
    /// Font name as the document declares it (subset prefix stripped).
    pub font: String,
    /// Rendered font size in points.
    pub size: f64,
    /// Bitmask of [`FLAG_ITALIC`] and [`FLAG_BOLD`].
    pub flags: u32,
    pub color: Rgb,
    pub text: String,
}

/// Which kind of path primitive a [`RawDrawing`] is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawingShape {
    /// A straight segment from `from` to `to`.
    Segment { from: Point, to: Point },
    /// An axis-aligned rectangle.
    Rect(BBox),
}

/// A painted path primitive.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDrawing {
    pub shape: DrawingShape,
    /// Stroke color, if the path was stroked.
    pub stroke: Option<Rgb>,
    /// Fill color, if the path was filled.
    pub fill: Option<Rgb>,
    /// Stroke width.
    pub width: f64,
    /// Whether a non-empty dash array was in effect.
    pub dashed: bool,
}

impl RawDrawing {
    pub fn segment(from: Point, to: Point) -> Self {
        Self {
            shape: DrawingShape::Segment { from, to },
            stroke: None,
            fill: None,
            width: 1.0,
            dashed: false,
        }
    }

    pub fn rect(bbox: BBox) -> Self {
        Self {
            shape: DrawingShape::Rect(bbox),
            stroke: None,
            fill: None,
            width: 1.0,
            dashed: false,
        }
    }

    pub fn with_stroke(mut self, color: Rgb, width: f64) -> Self {
        self.stroke = Some(color);
        self.width = width;
        self
    }

    pub fn with_fill(mut self, color: Rgb) -> Self {
        self.fill = Some(color);
        self
    }

    pub fn dashed(mut self, dashed: bool) -> Self {
        self.dashed = dashed;
        self
    }
}

/// A raster image placed on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct RawImage {
    /// Engine-specific source reference, e.g. `"12 0 R"`.
    pub source_ref: String,
    pub ext: String,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
    /// Where the image is drawn, if known.
    pub bbox: Option<BBox>,
}
