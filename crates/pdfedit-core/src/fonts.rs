//! Font substitution for reconstruction.
//!
//! The writer can only draw with the standard base fonts, so every font
//! name in a record is mapped onto one of five families and then onto a
//! concrete face by composing the bold/italic variant name.

use std::fmt;

/// The base font families the writer supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseFont {
    Sans,
    Serif,
    Monospace,
    Symbol,
    Dingbats,
}

impl BaseFont {
    /// Face name for the given variant, e.g. `Times-BoldItalic`.
    ///
    /// Symbol and Dingbats have no variants and ignore the flags.
    pub fn face(self, bold: bool, italic: bool) -> &'static str {
        match (self, bold, italic) {
            (BaseFont::Sans, false, false) => "Helvetica",
            (BaseFont::Sans, true, false) => "Helvetica-Bold",
            (BaseFont::Sans, false, true) => "Helvetica-Oblique",
            (BaseFont::Sans, true, true) => "Helvetica-BoldOblique",
            (BaseFont::Serif, false, false) => "Times-Roman",
            (BaseFont::Serif, true, false) => "Times-Bold",
            (BaseFont::Serif, false, true) => "Times-Italic",
            (BaseFont::Serif, true, true) => "Times-BoldItalic",
            (BaseFont::Monospace, false, false) => "Courier",
            (BaseFont::Monospace, true, false) => "Courier-Bold",
            (BaseFont::Monospace, false, true) => "Courier-Oblique",
            (BaseFont::Monospace, true, true) => "Courier-BoldOblique",
            (BaseFont::Symbol, _, _) => "Symbol",
            (BaseFont::Dingbats, _, _) => "ZapfDingbats",
        }
    }

    /// Whether the face has bold/italic variants.
    pub fn has_variants(self) -> bool {
        !matches!(self, BaseFont::Symbol | BaseFont::Dingbats)
    }
}

impl fmt::Display for BaseFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.face(false, false))
    }
}

/// Identifiers (lowercase) that name a base font directly, including the
/// short resource names common in form-filling tools.
const DIRECT_NAMES: &[(&str, BaseFont)] = &[
    ("zapfdingbats", BaseFont::Dingbats),
    ("zadb", BaseFont::Dingbats),
    ("symbol", BaseFont::Symbol),
    ("symb", BaseFont::Symbol),
    ("courier", BaseFont::Monospace),
    ("cour", BaseFont::Monospace),
    ("times", BaseFont::Serif),
    ("tiro", BaseFont::Serif),
    ("helvetica", BaseFont::Sans),
    ("helv", BaseFont::Sans),
];

/// Substring hints, checked in order.
const FAMILY_HINTS: &[(&str, BaseFont)] = &[
    ("helvetica", BaseFont::Sans),
    ("arial", BaseFont::Sans),
    ("sans", BaseFont::Sans),
    ("times", BaseFont::Serif),
    ("roman", BaseFont::Serif),
    ("serif", BaseFont::Serif),
    ("courier", BaseFont::Monospace),
    ("mono", BaseFont::Monospace),
];

/// A resolved font: the family, the composed face, and the size.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFont {
    pub base: BaseFont,
    /// Standard face name, e.g. `Helvetica-BoldOblique`.
    pub face: &'static str,
    pub size: f64,
}

/// Maps arbitrary font names onto the base fonts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontResolver {
    fallback: BaseFont,
}

impl Default for FontResolver {
    fn default() -> Self {
        Self {
            fallback: BaseFont::Sans,
        }
    }
}

impl FontResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `fallback` for names that match nothing.
    pub fn with_fallback(fallback: BaseFont) -> Self {
        Self { fallback }
    }

    /// The family `font_name` maps to.
    ///
    /// A name that starts with a base font identifier (any case) resolves
    /// to it directly. Otherwise the name is searched for family hints, and
    /// finally the fallback family is used.
    pub fn family(&self, font_name: &str) -> BaseFont {
        let lower = font_name.trim().to_lowercase();
        if let Some((_, base)) = DIRECT_NAMES.iter().find(|(id, _)| lower.starts_with(id)) {
            return *base;
        }
        FAMILY_HINTS
            .iter()
            .find(|(hint, _)| lower.contains(hint))
            .map_or(self.fallback, |(_, base)| *base)
    }

    pub fn resolve(&self, font_name: &str, size: f64, bold: bool, italic: bool) -> ResolvedFont {
        let base = self.family(font_name);
        ResolvedFont {
            base,
            face: base.face(bold, italic),
            size,
        }
    }
}
