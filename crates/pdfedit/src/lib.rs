//! pdfedit: extract PDF pages into an editable model and write them back.
//!
//! This is the public API facade crate. It re-exports the model from
//! pdfedit-core and uses pdfedit-parse for reading and writing documents.
//!
//! # Architecture
//!
//! - **pdfedit-core**: Model types, palettes, classifiers, font resolution
//! - **pdfedit-parse**: lopdf-backed document engine and writer
//! - **pdfedit** (this crate): Page and document pipelines, the
//!   degrade-and-log policy, and the [`Editor`] host API
//!
//! # Example
//!
//! ```ignore
//! use pdfedit::{DocumentExtractor, DocumentReconstructor};
//!
//! let extraction = DocumentExtractor::<pdfedit::LopdfEngine>::default().extract(&bytes)?;
//! let mut record: pdfedit::DocumentRecord = extraction.document.into();
//! record.pages[0].texts[0].runs[0].text = "Edited".into();
//! let rebuilt = DocumentReconstructor::<pdfedit::LopdfWriter>::default().reconstruct(record)?;
//! ```

pub mod degrade;
pub mod editor;
pub mod extract;
pub mod history;
pub mod reconstruct;

pub use pdfedit_core;
pub use pdfedit_parse;

pub use degrade::{Degrade, Outcome, Report};
pub use editor::Editor;
pub use extract::{DocumentExtractor, Extraction, PageExtractor};
pub use history::History;
pub use pdfedit_core::{
    Align, BaseFont, ColorPalette, DashPattern, Document, DocumentRecord, ElementKind,
    ExtractOptions, Fill, FontResolver, HLine, Image, ItemError, Page, PageRecord, PageStage,
    PdfEditError, Placement, ReconstructOptions, RejectedElement, Rgb, StylePalette, StyleTuple,
    StyledSpan, TextRun, VLine,
};
pub use pdfedit_parse::{DocumentEngine, DocumentWriter, LopdfEngine, LopdfWriter};
pub use reconstruct::{DocumentReconstructor, Reconstruction};
