//! Error types for the engine layer.
//!
//! Uses [`thiserror`] for ergonomic error derivation. Provides [`BackendError`]
//! that wraps engine-specific errors and converts them to [`PdfEditError`].

use pdfedit_core::PdfEditError;
use thiserror::Error;

/// Error type for document engine operations.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Error from document parsing (structure, syntax, object resolution).
    #[error("PDF parse error: {0}")]
    Parse(String),

    /// Error reading or writing data.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error resolving font or encoding information.
    #[error("font error: {0}")]
    Font(String),

    /// Error during content stream interpretation.
    #[error("interpreter error: {0}")]
    Interpreter(String),

    /// One element could not be placed on an output page.
    #[error("placement error: {0}")]
    Placement(String),

    /// The output document could not be encoded.
    #[error("serialization error: {0}")]
    Serialize(String),

    /// A core library error.
    #[error(transparent)]
    Core(#[from] PdfEditError),
}

impl From<lopdf::Error> for BackendError {
    fn from(err: lopdf::Error) -> Self {
        BackendError::Parse(err.to_string())
    }
}

impl From<BackendError> for PdfEditError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Parse(msg) => PdfEditError::ParseError(msg),
            BackendError::Io(e) => PdfEditError::IoError(e.to_string()),
            BackendError::Font(msg) => PdfEditError::ParseError(format!("font: {msg}")),
            BackendError::Interpreter(msg) => PdfEditError::ParseError(msg),
            BackendError::Placement(msg) => PdfEditError::ValidationError(msg),
            BackendError::Serialize(msg) => PdfEditError::SerializationError(msg),
            BackendError::Core(e) => e,
        }
    }
}
