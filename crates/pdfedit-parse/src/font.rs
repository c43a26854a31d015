//! Font loading for text extraction.
//!
//! Turns a font resource dictionary into a [`LoadedFont`]: how to split a
//! shown string into character codes, how to map each code to text, the
//! advance width of each code, the vertical metrics used for glyph boxes,
//! and the style flags derived from the font descriptor.

use std::collections::HashMap;

use lopdf::{Dictionary, Document, Object};
use pdfedit_core::{FLAG_BOLD, FLAG_ITALIC};

use crate::encoding::{BaseEncoding, SimpleEncoding, glyph_name_to_char};
use crate::error::BackendError;
use crate::objects::{get, get_dict, get_f64, get_name, resolve, to_f64};
use crate::standard_fonts;
use crate::to_unicode::ToUnicodeMap;

/// Default ascent when neither a descriptor nor standard metrics exist.
const DEFAULT_ASCENT: f64 = 750.0;

/// Default descent when neither a descriptor nor standard metrics exist.
const DEFAULT_DESCENT: f64 = -250.0;

/// Default character width when not specified.
const DEFAULT_WIDTH: f64 = 600.0;

/// Default width for CID fonts without `/DW`.
const DEFAULT_CID_WIDTH: f64 = 1000.0;

/// `/Flags` bit 7: italic.
const DESCRIPTOR_ITALIC: i64 = 1 << 6;
/// `/Flags` bit 19: force bold.
const DESCRIPTOR_FORCE_BOLD: i64 = 1 << 18;

/// One decoded character code.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub code: u32,
    pub text: String,
    /// Advance width in glyph space units (1/1000 of text space).
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq)]
enum Widths {
    Simple {
        first_char: u32,
        widths: Vec<f64>,
        missing: f64,
    },
    Standard(&'static standard_fonts::StandardFontData),
    Cid {
        widths: HashMap<u32, f64>,
        default: f64,
    },
}

/// A font resource ready for decoding shown strings.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedFont {
    /// BaseFont name with any subset prefix removed.
    pub name: String,
    /// Ascent in glyph space units.
    pub ascent: f64,
    /// Descent in glyph space units (negative).
    pub descent: f64,
    /// Engine style flags ([`FLAG_ITALIC`], [`FLAG_BOLD`]).
    pub style_flags: u32,
    two_byte: bool,
    widths: Widths,
    encoding: Option<SimpleEncoding>,
    to_unicode: Option<ToUnicodeMap>,
}

impl LoadedFont {
    /// Fallback used when a `Tf` names a font the resources lack.
    pub fn fallback(name: &str) -> Self {
        let standard = standard_fonts::lookup(name);
        Self {
            name: name.to_string(),
            ascent: standard.map_or(DEFAULT_ASCENT, |s| f64::from(s.ascent)),
            descent: standard.map_or(DEFAULT_DESCENT, |s| f64::from(s.descent)),
            style_flags: 0,
            two_byte: false,
            widths: match standard {
                Some(data) => Widths::Standard(data),
                None => Widths::Simple {
                    first_char: 0,
                    widths: Vec::new(),
                    missing: DEFAULT_WIDTH,
                },
            },
            encoding: Some(SimpleEncoding::from_base(BaseEncoding::WinAnsi)),
            to_unicode: None,
        }
    }

    /// Whether shown strings use two-byte codes.
    pub fn is_two_byte(&self) -> bool {
        self.two_byte
    }

    /// Split a shown string into glyphs.
    pub fn decode(&self, bytes: &[u8]) -> Vec<Glyph> {
        if self.two_byte {
            bytes
                .chunks(2)
                .map(|pair| {
                    let code = match pair {
                        [hi, lo] => (u32::from(*hi) << 8) | u32::from(*lo),
                        [b] => u32::from(*b),
                        _ => 0,
                    };
                    self.glyph(code)
                })
                .collect()
        } else {
            bytes.iter().map(|&b| self.glyph(u32::from(b))).collect()
        }
    }

    fn glyph(&self, code: u32) -> Glyph {
        Glyph {
            code,
            text: self.text_for(code),
            width: self.width(code),
        }
    }

    fn text_for(&self, code: u32) -> String {
        if let Some(text) = self.to_unicode.as_ref().and_then(|m| m.lookup(code)) {
            return text.to_string();
        }
        if self.two_byte {
            return '\u{FFFD}'.to_string();
        }
        let byte = code as u8;
        match &self.encoding {
            Some(enc) => enc.decode(byte).unwrap_or('\u{FFFD}').to_string(),
            // Built-in encodings (Symbol, ZapfDingbats) pass codes through.
            None => char::from(byte).to_string(),
        }
    }

    /// Advance width of `code` in glyph space units.
    pub fn width(&self, code: u32) -> f64 {
        match &self.widths {
            Widths::Simple {
                first_char,
                widths,
                missing,
            } => code
                .checked_sub(*first_char)
                .and_then(|i| widths.get(i as usize))
                .copied()
                .unwrap_or(*missing),
            Widths::Standard(data) => u8::try_from(code).map_or(DEFAULT_WIDTH, |c| data.width(c)),
            Widths::Cid { widths, default } => widths.get(&code).copied().unwrap_or(*default),
        }
    }
}

/// Load a font from its resource dictionary.
pub fn load_font(doc: &Document, font_dict: &Dictionary) -> Result<LoadedFont, BackendError> {
    let raw_name = get_name(doc, font_dict, b"BaseFont")
        .map(|n| String::from_utf8_lossy(n).into_owned())
        .unwrap_or_default();
    let name = strip_subset_prefix(&raw_name).to_string();
    let is_type0 = get_name(doc, font_dict, b"Subtype") == Some(&b"Type0"[..]);

    let to_unicode = match get(doc, font_dict, b"ToUnicode").and_then(|o| o.as_stream().ok()) {
        Some(stream) => {
            let data = stream
                .decompressed_content()
                .unwrap_or_else(|_| stream.content.clone());
            Some(ToUnicodeMap::parse(&data)?)
        }
        None => None,
    };

    if is_type0 {
        let descendant = descendant_font(doc, font_dict).ok_or_else(|| {
            BackendError::Font(format!("Type0 font {name} has no descendant font"))
        })?;
        let descriptor = get_dict(doc, descendant, b"FontDescriptor");
        let (ascent, descent) = vertical_metrics(doc, descriptor, None);
        return Ok(LoadedFont {
            name,
            ascent,
            descent,
            style_flags: style_flags(doc, descriptor),
            two_byte: true,
            widths: cid_widths(doc, descendant),
            encoding: None,
            to_unicode,
        });
    }

    let standard = standard_fonts::lookup(&name);
    let descriptor = get_dict(doc, font_dict, b"FontDescriptor");
    let (ascent, descent) = vertical_metrics(doc, descriptor, standard);
    let widths = simple_widths(doc, font_dict, descriptor, standard);
    let encoding = simple_encoding(doc, font_dict, &name);

    Ok(LoadedFont {
        name,
        ascent,
        descent,
        style_flags: style_flags(doc, descriptor),
        two_byte: false,
        widths,
        encoding,
        to_unicode,
    })
}

/// Remove a six-letter subset tag such as `ABCDEF+`.
pub fn strip_subset_prefix(name: &str) -> &str {
    match name.split_once('+') {
        Some((tag, rest)) if tag.len() == 6 && tag.bytes().all(|b| b.is_ascii_uppercase()) => rest,
        _ => name,
    }
}

fn descendant_font<'a>(doc: &'a Document, font_dict: &'a Dictionary) -> Option<&'a Dictionary> {
    let arr = get(doc, font_dict, b"DescendantFonts")?.as_array().ok()?;
    resolve(doc, arr.first()?).as_dict().ok()
}

fn vertical_metrics(
    doc: &Document,
    descriptor: Option<&Dictionary>,
    standard: Option<&standard_fonts::StandardFontData>,
) -> (f64, f64) {
    let from_descriptor = |key: &[u8]| {
        descriptor
            .and_then(|d| get_f64(doc, d, key))
            .filter(|v| *v != 0.0)
    };
    let ascent = from_descriptor(b"Ascent")
        .or_else(|| standard.map(|s| f64::from(s.ascent)))
        .unwrap_or(DEFAULT_ASCENT);
    let descent = from_descriptor(b"Descent")
        .or_else(|| standard.map(|s| f64::from(s.descent)))
        .unwrap_or(DEFAULT_DESCENT);
    (ascent, descent)
}

fn style_flags(doc: &Document, descriptor: Option<&Dictionary>) -> u32 {
    let Some(desc) = descriptor else {
        return 0;
    };
    let flags = get(doc, desc, b"Flags")
        .and_then(|o| o.as_i64().ok())
        .unwrap_or(0);
    let italic_angle = get_f64(doc, desc, b"ItalicAngle").unwrap_or(0.0);
    let weight = get_f64(doc, desc, b"FontWeight").unwrap_or(400.0);

    let mut style = 0;
    if flags & DESCRIPTOR_ITALIC != 0 || italic_angle != 0.0 {
        style |= FLAG_ITALIC;
    }
    if flags & DESCRIPTOR_FORCE_BOLD != 0 || weight >= 600.0 {
        style |= FLAG_BOLD;
    }
    style
}

fn simple_widths(
    doc: &Document,
    font_dict: &Dictionary,
    descriptor: Option<&Dictionary>,
    standard: Option<&'static standard_fonts::StandardFontData>,
) -> Widths {
    let widths: Option<Vec<f64>> = get(doc, font_dict, b"Widths")
        .and_then(|o| o.as_array().ok())
        .map(|arr| {
            arr.iter()
                .map(|o| to_f64(resolve(doc, o)).unwrap_or(0.0))
                .collect()
        });
    match (widths, standard) {
        (Some(widths), _) => Widths::Simple {
            first_char: get_f64(doc, font_dict, b"FirstChar").map_or(0, |v| v as u32),
            widths,
            missing: descriptor
                .and_then(|d| get_f64(doc, d, b"MissingWidth"))
                .unwrap_or(DEFAULT_WIDTH),
        },
        (None, Some(data)) => Widths::Standard(data),
        (None, None) => Widths::Simple {
            first_char: 0,
            widths: Vec::new(),
            missing: DEFAULT_WIDTH,
        },
    }
}

/// Parse a CID font `/W` array: `c [w1 w2 ...]` and `c_first c_last w` forms.
fn cid_widths(doc: &Document, descendant: &Dictionary) -> Widths {
    let default = get_f64(doc, descendant, b"DW").unwrap_or(DEFAULT_CID_WIDTH);
    let mut widths = HashMap::new();
    if let Some(arr) = get(doc, descendant, b"W").and_then(|o| o.as_array().ok()) {
        let items: Vec<&Object> = arr.iter().map(|o| resolve(doc, o)).collect();
        let mut i = 0;
        while i < items.len() {
            let Some(first) = to_f64(items[i]).map(|v| v as u32) else {
                break;
            };
            match items.get(i + 1) {
                Some(Object::Array(list)) => {
                    for (k, w) in list.iter().enumerate() {
                        if let Some(w) = to_f64(resolve(doc, w)) {
                            widths.insert(first + k as u32, w);
                        }
                    }
                    i += 2;
                }
                Some(last) => {
                    let (Some(last), Some(w)) =
                        (to_f64(last), items.get(i + 2).and_then(|o| to_f64(o)))
                    else {
                        break;
                    };
                    for code in first..=(last as u32).min(first + 0xFFFF) {
                        widths.insert(code, w);
                    }
                    i += 3;
                }
                None => break,
            }
        }
    }
    Widths::Cid { widths, default }
}

fn simple_encoding(doc: &Document, font_dict: &Dictionary, name: &str) -> Option<SimpleEncoding> {
    let default_base = if standard_fonts::has_builtin_encoding(name) {
        None
    } else {
        Some(BaseEncoding::Standard)
    };
    match get(doc, font_dict, b"Encoding") {
        Some(Object::Name(n)) => {
            BaseEncoding::from_name(n).or(default_base).map(SimpleEncoding::from_base)
        }
        Some(Object::Dictionary(dict)) => {
            let base = get_name(doc, dict, b"BaseEncoding")
                .and_then(BaseEncoding::from_name)
                .or(default_base)
                .unwrap_or(BaseEncoding::Standard);
            let mut encoding = SimpleEncoding::from_base(base);
            if let Some(diffs) = get(doc, dict, b"Differences").and_then(|o| o.as_array().ok()) {
                encoding.apply_differences(&parse_differences(diffs));
            }
            Some(encoding)
        }
        _ => default_base.map(SimpleEncoding::from_base),
    }
}

/// Parse a `/Differences` array: a code followed by glyph names for
/// consecutive codes, repeated.
fn parse_differences(arr: &[Object]) -> Vec<(u8, char)> {
    let mut out = Vec::new();
    let mut code: Option<u32> = None;
    for obj in arr {
        match obj {
            Object::Integer(i) => code = u32::try_from(*i).ok(),
            Object::Name(glyph) => {
                if let Some(c) = code {
                    let name = String::from_utf8_lossy(glyph);
                    if let (Ok(byte), Some(ch)) = (u8::try_from(c), glyph_name_to_char(&name)) {
                        out.push((byte, ch));
                    }
                    code = Some(c + 1);
                }
            }
            _ => {}
        }
    }
    out
}
