//! Bold/italic inference for raw text spans.
//!
//! Flag bits always win over the font name: the name is only consulted
//! when the corresponding bit is clear.

use crate::model::{StyleTuple, StyledSpan};
use crate::raw::{FLAG_BOLD, FLAG_ITALIC, RawSpan};

const BOLD_MARKERS: &[&str] = &["bold", "black", "heavy", "extra"];
const ITALIC_MARKERS: &[&str] = &["italic", "oblique", "slant"];

/// Whether a span with these flags and font name renders bold.
pub fn is_bold(flags: u32, font_name: &str) -> bool {
    flags & FLAG_BOLD != 0 || name_contains_any(font_name, BOLD_MARKERS)
}

/// Whether a span with these flags and font name renders italic.
pub fn is_italic(flags: u32, font_name: &str) -> bool {
    flags & FLAG_ITALIC != 0 || name_contains_any(font_name, ITALIC_MARKERS)
}

fn name_contains_any(font_name: &str, markers: &[&str]) -> bool {
    let lower = font_name.to_lowercase();
    markers.iter().any(|m| lower.contains(m))
}

/// Normalize a raw span's font information into a [`StyleTuple`].
pub fn classify(span: &RawSpan) -> StyleTuple {
    StyleTuple::new(
        span.font.clone(),
        span.size,
        is_bold(span.flags, &span.font),
        is_italic(span.flags, &span.font),
    )
}

/// The single styled span an extracted text run carries.
pub fn styled_span(span: &RawSpan) -> StyledSpan {
    StyledSpan::new(span.text.clone(), classify(span))
}
