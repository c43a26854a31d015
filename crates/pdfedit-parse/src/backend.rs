//! Document engine traits.
//!
//! [`DocumentEngine`] is the reading side: open a document and pull raw
//! spans, drawing primitives and images out of a page. [`DocumentWriter`]
//! is the writing side: build a new document from pages and primitive
//! placements. The extraction and reconstruction pipelines are generic over
//! these traits; [`LopdfEngine`](crate::LopdfEngine) and
//! [`LopdfWriter`](crate::LopdfWriter) are the lopdf-backed implementations.

use pdfedit_core::{DashPattern, ExtractOptions, PdfEditError, Placement, Point, RawDrawing, RawImage, RawSpan, ReconstructOptions, Rgb};

/// Primitives of one page read.
///
/// A read keeps at most [`ExtractOptions::max_elements_per_page`] items;
/// `dropped` counts the ones past that cap. Derefs to the kept items.
#[derive(Debug, Clone, PartialEq)]
pub struct PageItems<T> {
    pub items: Vec<T>,
    pub dropped: usize,
}

impl<T> PageItems<T> {
    pub fn new(items: Vec<T>, dropped: usize) -> Self {
        Self { items, dropped }
    }

    /// Whether the per-page cap cut this read short.
    pub fn is_truncated(&self) -> bool {
        self.dropped > 0
    }
}

impl<T> Default for PageItems<T> {
    fn default() -> Self {
        Self::new(Vec::new(), 0)
    }
}

impl<T> From<Vec<T>> for PageItems<T> {
    fn from(items: Vec<T>) -> Self {
        Self::new(items, 0)
    }
}

impl<T> std::ops::Deref for PageItems<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.items
    }
}

impl<T> IntoIterator for PageItems<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a PageItems<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Reading primitives of a document engine.
///
/// Page indices are 0-based. Each per-page read is independent: a failure
/// in one does not affect the others.
///
/// ```ignore
/// let doc = MyEngine::open(bytes)?;
/// for i in 0..MyEngine::page_count(&doc) {
///     let (width, height) = MyEngine::page_size(&doc, i)?;
///     let spans = MyEngine::text_spans(&doc, i, &options)?;
/// }
/// ```
pub trait DocumentEngine {
    /// The opened document.
    type Document;

    /// Engine-specific error type, convertible to [`PdfEditError`].
    type Error: std::error::Error + Into<PdfEditError>;

    /// Parse document bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a readable document.
    fn open(bytes: &[u8]) -> Result<Self::Document, Self::Error>;

    fn page_count(doc: &Self::Document) -> usize;

    /// Page width and height in points.
    fn page_size(doc: &Self::Document, index: usize) -> Result<(f64, f64), Self::Error>;

    /// Text spans of a page, in content order.
    fn text_spans(
        doc: &Self::Document,
        index: usize,
        options: &ExtractOptions,
    ) -> Result<PageItems<RawSpan>, Self::Error>;

    /// Straight segments and rectangles painted on a page.
    fn drawing_primitives(
        doc: &Self::Document,
        index: usize,
        options: &ExtractOptions,
    ) -> Result<PageItems<RawDrawing>, Self::Error>;

    /// Raster images drawn on a page.
    fn raster_images(
        doc: &Self::Document,
        index: usize,
        options: &ExtractOptions,
    ) -> Result<PageItems<RawImage>, Self::Error>;
}

/// A text placement request. Coordinates use the top-left page origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextPlacement<'a> {
    /// Left edge of the first glyph.
    pub x: f64,
    /// Baseline position, measured from the top of the page.
    pub baseline: f64,
    pub text: &'a str,
    /// A base font face name, e.g. `Helvetica-Bold`.
    pub face: &'a str,
    pub size: f64,
    pub color: Rgb,
}

/// A straight stroke request. Coordinates use the top-left page origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinePlacement<'a> {
    pub from: Point,
    pub to: Point,
    pub width: f64,
    pub color: Rgb,
    /// Dash pattern to stroke with, or `None` for a solid line.
    pub dash: Option<&'a DashPattern>,
}

/// Writing primitives of a document engine.
pub trait DocumentWriter: Sized {
    /// Handle of a page created by [`new_page`](Self::new_page).
    type Page: Copy;

    /// Engine-specific error type, convertible to [`PdfEditError`].
    type Error: std::error::Error + Into<PdfEditError>;

    /// An empty document.
    fn new_document() -> Self;

    fn new_page(&mut self, width: f64, height: f64) -> Self::Page;

    /// Draw one line of text in a base font.
    fn place_text(&mut self, page: Self::Page, text: &TextPlacement<'_>) -> Result<(), Self::Error>;

    fn place_line(&mut self, page: Self::Page, line: &LinePlacement<'_>) -> Result<(), Self::Error>;

    /// Fill an axis-aligned rectangle.
    fn place_rect(&mut self, page: Self::Page, rect: &Placement, fill: Rgb) -> Result<(), Self::Error>;

    /// Draw encoded image bytes scaled into `rect`.
    fn place_image(
        &mut self,
        page: Self::Page,
        rect: &Placement,
        ext: &str,
        bytes: &[u8],
    ) -> Result<(), Self::Error>;

    /// Advance width of `text` in a base font, in points.
    fn measure(&self, face: &str, size: f64, text: &str) -> Result<f64, Self::Error>;

    /// Ascent of a base font in thousandths of the font size.
    fn ascent(&self, face: &str) -> Result<f64, Self::Error>;

    /// Encode the finished document.
    fn serialize(self, options: &ReconstructOptions) -> Result<Vec<u8>, Self::Error>;
}
