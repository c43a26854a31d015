//! pdfedit-parse: lopdf-backed document engine.
//!
//! The reading side opens a document and interprets page content streams
//! into raw spans, drawing primitives and images ([`LopdfEngine`]). The
//! writing side builds a new document from primitive placements
//! ([`LopdfWriter`]). Both implement the traits in [`backend`], which is all
//! the `pdfedit` facade depends on. Shared data types come from
//! pdfedit-core.

pub mod backend;
mod encoding;
pub mod engine;
pub mod error;
mod font;
mod graphics_state;
pub mod handler;
mod images;
mod interpreter;
mod objects;
mod paths;
pub mod spans;
mod standard_fonts;
mod text_state;
mod to_unicode;
pub mod writer;

pub use backend::{DocumentEngine, DocumentWriter, LinePlacement, PageItems, TextPlacement};
pub use engine::{LopdfDocument, LopdfEngine};
pub use error::BackendError;
pub use handler::{Collector, ContentClass, ContentHandler};
pub use pdfedit_core;
pub use spans::merge_spans;
pub use standard_fonts::STANDARD_FACES;
pub use writer::{LopdfWriter, WriterPage};
