//! Error types for pdfedit.
//!
//! Provides [`PdfEditError`] for call-level failures that stop an
//! extraction or reconstruction, and [`ItemError`] for failures confined to
//! one page sub-extraction or one element. Item errors are recovered at
//! their boundary and reported; they never abort the call.

use std::fmt;

/// Fatal error types for a whole extraction or reconstruction call.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfEditError {
    /// The input bytes cannot be opened as a document.
    ParseError(String),
    /// The finished document could not be encoded to bytes.
    SerializationError(String),
    /// The input record is structurally invalid as a whole.
    ValidationError(String),
    /// A configured resource limit was exceeded.
    ResourceLimitExceeded {
        /// Name of the limit that was exceeded (e.g., "max_input_bytes").
        limit_name: String,
        /// The configured limit value.
        limit_value: usize,
        /// The actual value that exceeded the limit.
        actual_value: usize,
    },
    /// I/O error reading input or writing output.
    IoError(String),
}

impl fmt::Display for PdfEditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PdfEditError::ParseError(msg) => write!(f, "parse error: {msg}"),
            PdfEditError::SerializationError(msg) => write!(f, "serialization error: {msg}"),
            PdfEditError::ValidationError(msg) => write!(f, "validation error: {msg}"),
            PdfEditError::ResourceLimitExceeded {
                limit_name,
                limit_value,
                actual_value,
            } => write!(
                f,
                "resource limit exceeded: {limit_name} (limit: {limit_value}, actual: {actual_value})"
            ),
            PdfEditError::IoError(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for PdfEditError {}

impl From<std::io::Error> for PdfEditError {
    fn from(err: std::io::Error) -> Self {
        PdfEditError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for PdfEditError {
    fn from(err: serde_json::Error) -> Self {
        PdfEditError::ValidationError(err.to_string())
    }
}

/// Which read of a page failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStage {
    Size,
    Text,
    Images,
    Drawings,
}

impl PageStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageStage::Size => "size",
            PageStage::Text => "text",
            PageStage::Images => "images",
            PageStage::Drawings => "drawings",
        }
    }
}

impl fmt::Display for PageStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of model element, for placement diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Text,
    Image,
    HLine,
    VLine,
    Fill,
}

impl ElementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Text => "text",
            ElementKind::Image => "image",
            ElementKind::HLine => "hline",
            ElementKind::VLine => "vline",
            ElementKind::Fill => "fill",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure confined to one page read or one element.
///
/// Page indices are 0-based.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemError {
    /// One sub-extraction of a page failed, leaving that list empty, or
    /// was cut short by the per-page element cap.
    PageExtraction {
        page: usize,
        stage: PageStage,
        reason: String,
    },
    /// One element could not be placed during reconstruction.
    ElementPlacement {
        page: usize,
        element: ElementKind,
        index: usize,
        reason: String,
    },
    /// A page record is missing required fields; the page is skipped.
    Validation { page: usize, reason: String },
}

impl ItemError {
    pub fn page(&self) -> usize {
        match self {
            ItemError::PageExtraction { page, .. }
            | ItemError::ElementPlacement { page, .. }
            | ItemError::Validation { page, .. } => *page,
        }
    }

    pub fn reason(&self) -> &str {
        match self {
            ItemError::PageExtraction { reason, .. }
            | ItemError::ElementPlacement { reason, .. }
            | ItemError::Validation { reason, .. } => reason,
        }
    }
}

impl fmt::Display for ItemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemError::PageExtraction {
                page,
                stage,
                reason,
            } => write!(f, "page {page}: {stage} extraction failed: {reason}"),
            ItemError::ElementPlacement {
                page,
                element,
                index,
                reason,
            } => write!(f, "page {page}: {element} #{index} skipped: {reason}"),
            ItemError::Validation { page, reason } => {
                write!(f, "page {page}: invalid record: {reason}")
            }
        }
    }
}

impl std::error::Error for ItemError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_level_messages() {
        assert_eq!(
            PdfEditError::ParseError("not a PDF".to_string()).to_string(),
            "parse error: not a PDF"
        );
        assert_eq!(
            PdfEditError::SerializationError("xref".to_string()).to_string(),
            "serialization error: xref"
        );
        let err = PdfEditError::ResourceLimitExceeded {
            limit_name: "max_pages".to_string(),
            limit_value: 2,
            actual_value: 3,
        };
        assert_eq!(
            err.to_string(),
            "resource limit exceeded: max_pages (limit: 2, actual: 3)"
        );
    }

    #[test]
    fn io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.pdf");
        let err: PdfEditError = io.into();
        assert!(matches!(err, PdfEditError::IoError(ref m) if m.contains("missing.pdf")));
    }

    #[test]
    fn json_error_is_a_validation_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: PdfEditError = json_err.into();
        assert!(matches!(err, PdfEditError::ValidationError(_)));
    }

    #[test]
    fn item_error_context() {
        let err = ItemError::PageExtraction {
            page: 2,
            stage: PageStage::Drawings,
            reason: "bad operand".to_string(),
        };
        assert_eq!(err.page(), 2);
        assert_eq!(err.reason(), "bad operand");
        assert_eq!(
            err.to_string(),
            "page 2: drawings extraction failed: bad operand"
        );

        let err = ItemError::ElementPlacement {
            page: 0,
            element: ElementKind::Image,
            index: 3,
            reason: "no placement".to_string(),
        };
        assert_eq!(err.to_string(), "page 0: image #3 skipped: no placement");

        let err = ItemError::Validation {
            page: 1,
            reason: "missing width".to_string(),
        };
        assert_eq!(err.to_string(), "page 1: invalid record: missing width");
    }
}
