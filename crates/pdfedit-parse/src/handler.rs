//! Content handler callback trait for content stream interpretation.
//!
//! The interpreter calls handler methods as it processes page content.
//! Each read of a page asks for one [`ContentClass`]; operators of other
//! classes are still tracked for state but their errors are ignored, so a
//! corrupt path does not prevent the text of the same page from being read.

use pdfedit_core::{RawDrawing, RawImage, RawSpan};

use crate::backend::PageItems;

/// The three kinds of content a page read can collect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentClass {
    Text,
    Paths,
    Images,
}

/// Callback handler for content stream interpretation.
///
/// All event methods have no-op defaults.
pub trait ContentHandler {
    /// Whether this handler collects `class`.
    ///
    /// Malformed operators of a collected class abort interpretation;
    /// operators of other classes are skipped without decoding.
    fn collects(&self, class: ContentClass) -> bool;

    /// Called once per text-showing operator.
    fn on_span(&mut self, _span: RawSpan) {}

    /// Called for each primitive of a painted path.
    fn on_drawing(&mut self, _drawing: RawDrawing) {}

    /// Called when an image XObject is placed.
    fn on_image(&mut self, _image: RawImage) {}
}

/// A handler that collects exactly one class, up to a limit.
///
/// Items past the limit are counted, not kept.
#[derive(Debug)]
pub struct Collector<T> {
    class: ContentClass,
    limit: usize,
    pub items: Vec<T>,
    pub dropped: usize,
}

impl<T> Collector<T> {
    pub fn new(class: ContentClass, limit: usize) -> Self {
        Self {
            class,
            limit,
            items: Vec::new(),
            dropped: 0,
        }
    }

    fn push(&mut self, item: T) {
        if self.items.len() < self.limit {
            self.items.push(item);
        } else {
            self.dropped += 1;
        }
    }

    pub fn into_items(self) -> PageItems<T> {
        PageItems::new(self.items, self.dropped)
    }
}

impl ContentHandler for Collector<RawSpan> {
    fn collects(&self, class: ContentClass) -> bool {
        class == self.class
    }

    fn on_span(&mut self, span: RawSpan) {
        self.push(span);
    }
}

impl ContentHandler for Collector<RawDrawing> {
    fn collects(&self, class: ContentClass) -> bool {
        class == self.class
    }

    fn on_drawing(&mut self, drawing: RawDrawing) {
        self.push(drawing);
    }
}

impl ContentHandler for Collector<RawImage> {
    fn collects(&self, class: ContentClass) -> bool {
        class == self.class
    }

    fn on_image(&mut self, image: RawImage) {
        self.push(image);
    }
}
