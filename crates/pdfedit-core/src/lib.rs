//! pdfedit-core: Backend-independent model types and classification.
//!
//! This crate provides the edit-friendly document model ([`Document`],
//! [`Page`], [`TextRun`], ...), the two palettes, the text-style and
//! vector classifiers that turn raw engine primitives into model elements,
//! and the [`FontResolver`] used when writing a model back out. It knows
//! nothing about the document format itself; engines live in
//! `pdfedit-parse`.

pub mod color;
pub mod error;
pub mod fonts;
pub mod geometry;
pub mod model;
pub mod options;
pub mod palette;
pub mod raw;
pub mod record;
pub mod text_style;
pub mod vector;

pub use color::{Color, ParseRgbError, Rgb};
pub use error::{ElementKind, ItemError, PageStage, PdfEditError};
pub use fonts::{BaseFont, FontResolver, ResolvedFont};
pub use geometry::{BBox, Ctm, Point, flip_y};
pub use model::{
    Align, Document, Fill, HLine, Image, NO_DECORATION, Page, Placement, StyleTuple, StyledSpan,
    TextRun, VLine,
};
pub use options::{DashPattern, ExtractOptions, ReconstructOptions};
pub use palette::{ColorPalette, StylePalette};
pub use raw::{DrawingShape, FLAG_BOLD, FLAG_ITALIC, RawDrawing, RawImage, RawSpan};
pub use record::{DocumentRecord, PageRecord, RejectedElement};
pub use vector::{LINE_TOLERANCE, Vector};
