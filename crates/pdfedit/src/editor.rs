//! Host-facing API.

use pdfedit_core::{DocumentRecord, ExtractOptions, PdfEditError, ReconstructOptions};
use pdfedit_parse::{DocumentEngine, DocumentWriter, LopdfEngine, LopdfWriter};

use crate::extract::{DocumentExtractor, Extraction};
use crate::history::History;
use crate::reconstruct::{DocumentReconstructor, Reconstruction};

/// Extraction, reconstruction, and the history of extracted documents.
///
/// One `Editor` is meant to live for the whole process and be shared by
/// reference between request handlers.
///
/// ```ignore
/// let editor = Editor::new();
/// let extraction = editor.extract(&bytes)?;
/// let rebuilt = editor.reconstruct(extraction.document.into())?;
/// ```
pub struct Editor<E: DocumentEngine = LopdfEngine, W: DocumentWriter = LopdfWriter> {
    extractor: DocumentExtractor<E>,
    reconstructor: DocumentReconstructor<W>,
    history: History,
}

impl Editor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<E: DocumentEngine, W: DocumentWriter> Default for Editor<E, W> {
    fn default() -> Self {
        Self::with_options(ExtractOptions::default(), ReconstructOptions::default())
    }
}

impl<E: DocumentEngine, W: DocumentWriter> std::fmt::Debug for Editor<E, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("extractor", &self.extractor)
            .field("reconstructor", &self.reconstructor)
            .field("history", &self.history.len())
            .finish()
    }
}

impl<E: DocumentEngine, W: DocumentWriter> Editor<E, W> {
    pub fn with_options(extract: ExtractOptions, reconstruct: ReconstructOptions) -> Self {
        Self {
            extractor: DocumentExtractor::new(extract),
            reconstructor: DocumentReconstructor::new(reconstruct),
            history: History::new(),
        }
    }

    /// Extract a document and append it to the history.
    ///
    /// Failed calls leave the history unchanged.
    pub fn extract(&self, bytes: &[u8]) -> Result<Extraction, PdfEditError> {
        let extraction = self.extractor.extract(bytes)?;
        self.history.push(extraction.document.clone());
        Ok(extraction)
    }

    /// Every document extracted since the last clear, oldest first.
    pub fn list_history(&self) -> Vec<pdfedit_core::Document> {
        self.history.list()
    }

    pub fn clear_history(&self) {
        self.history.clear();
    }

    /// Reconstruct a document record. The history is not touched.
    pub fn reconstruct(&self, record: DocumentRecord) -> Result<Reconstruction, PdfEditError> {
        self.reconstructor.reconstruct(record)
    }
}
