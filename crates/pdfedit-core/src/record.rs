//! Lenient input records for reconstruction.
//!
//! An edited document arrives as JSON that may be missing fields. The
//! record types accept the same schema as [`Document`] with the page
//! header optional and every element list defaulting to empty; each page
//! is then validated into a strict [`Page`] before anything is drawn.
//!
//! Reading is confined per page and per element: a header field of the
//! wrong type marks only its page invalid, and an unreadable element is
//! set aside in [`PageRecord::rejected`] while its siblings are kept.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ElementKind, ItemError, PdfEditError};
use crate::model::{Document, Fill, HLine, Image, Page, TextRun, VLine};
use crate::palette::{ColorPalette, StylePalette};

/// A possibly edited document, as received for reconstruction.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "RawDocumentRecord")]
pub struct DocumentRecord {
    pub pages: Vec<PageRecord>,
    #[serde(rename = "colorPalette")]
    pub color_palette: ColorPalette,
}

impl DocumentRecord {
    /// Parse a record from JSON text.
    ///
    /// Fails only when the text is not a structurally valid record: bad
    /// JSON, `pages` not a list, or an unreadable `colorPalette`. Problems
    /// inside a page are reported later, per page, by
    /// [`PageRecord::validate`] and [`PageRecord::rejected`].
    pub fn from_json(json: &str) -> Result<Self, PdfEditError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl From<Document> for DocumentRecord {
    fn from(doc: Document) -> Self {
        Self {
            pages: doc.pages.into_iter().map(PageRecord::from).collect(),
            color_palette: doc.color_palette,
        }
    }
}

#[derive(Deserialize)]
struct RawDocumentRecord {
    #[serde(default)]
    pages: Vec<Value>,
    #[serde(rename = "colorPalette", default)]
    color_palette: ColorPalette,
}

impl From<RawDocumentRecord> for DocumentRecord {
    fn from(raw: RawDocumentRecord) -> Self {
        let pages = raw
            .pages
            .into_iter()
            .map(|value| {
                serde_json::from_value(value).unwrap_or_else(|err| PageRecord {
                    header_errors: vec![err.to_string()],
                    ..PageRecord::default()
                })
            })
            .collect();
        Self {
            pages,
            color_palette: raw.color_palette,
        }
    }
}

/// An element that could not be read from its list.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedElement {
    pub element: ElementKind,
    /// Position in the list as received.
    pub index: usize,
    pub reason: String,
}

impl RejectedElement {
    pub fn into_error(self, page: usize) -> ItemError {
        ItemError::ElementPlacement {
            page,
            element: self.element,
            index: self.index,
            reason: format!("unreadable: {}", self.reason),
        }
    }
}

/// A page as received for reconstruction.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "RawPageRecord")]
pub struct PageRecord {
    pub page_number: Option<u32>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub texts: Vec<TextRun>,
    pub images: Vec<Image>,
    pub hlines: Vec<HLine>,
    pub vlines: Vec<VLine>,
    pub fills: Vec<Fill>,
    pub fields: Vec<serde_json::Value>,
    pub boxsets: Vec<serde_json::Value>,
    #[serde(rename = "stylePalette")]
    pub style_palette: StylePalette,
    /// Elements dropped while reading; the rest of the page is kept.
    #[serde(skip)]
    pub rejected: Vec<RejectedElement>,
    /// Page-level fields that were present but unreadable.
    #[serde(skip)]
    pub header_errors: Vec<String>,
}

impl PageRecord {
    /// Check required fields and build a [`Page`].
    ///
    /// `index` is the 0-based position of the record; a missing page
    /// number defaults to `index + 1`. Entries in [`Self::rejected`] are
    /// not consulted here; the caller reports them separately.
    pub fn validate(self, index: usize) -> Result<Page, ItemError> {
        if !self.header_errors.is_empty() {
            return Err(ItemError::Validation {
                page: index,
                reason: self.header_errors.join("; "),
            });
        }
        let width = require_dimension(self.width, "width", index)?;
        let height = require_dimension(self.height, "height", index)?;
        Ok(Page {
            page_number: self.page_number.unwrap_or(index as u32 + 1),
            width,
            height,
            texts: self.texts,
            images: self.images,
            hlines: self.hlines,
            vlines: self.vlines,
            fills: self.fills,
            fields: self.fields,
            boxsets: self.boxsets,
            style_palette: self.style_palette,
        })
    }
}

fn require_dimension(value: Option<f64>, name: &str, page: usize) -> Result<f64, ItemError> {
    match value {
        None => Err(ItemError::Validation {
            page,
            reason: format!("missing {name}"),
        }),
        Some(v) if !v.is_finite() || v <= 0.0 => Err(ItemError::Validation {
            page,
            reason: format!("{name} must be positive, got {v}"),
        }),
        Some(v) => Ok(v),
    }
}

impl From<Page> for PageRecord {
    fn from(page: Page) -> Self {
        Self {
            page_number: Some(page.page_number),
            width: Some(page.width),
            height: Some(page.height),
            texts: page.texts,
            images: page.images,
            hlines: page.hlines,
            vlines: page.vlines,
            fills: page.fills,
            fields: page.fields,
            boxsets: page.boxsets,
            style_palette: page.style_palette,
            rejected: Vec::new(),
            header_errors: Vec::new(),
        }
    }
}

/// A page as it appears in JSON, before any field is interpreted.
#[derive(Deserialize)]
struct RawPageRecord {
    #[serde(default)]
    page_number: Value,
    #[serde(default)]
    width: Value,
    #[serde(default)]
    height: Value,
    #[serde(default)]
    texts: Value,
    #[serde(default)]
    images: Value,
    #[serde(default)]
    hlines: Value,
    #[serde(default)]
    vlines: Value,
    #[serde(default)]
    fills: Value,
    #[serde(default)]
    fields: Value,
    #[serde(default)]
    boxsets: Value,
    #[serde(rename = "stylePalette", default)]
    style_palette: Value,
}

impl From<RawPageRecord> for PageRecord {
    fn from(raw: RawPageRecord) -> Self {
        let mut reader = PageReader::default();
        let page_number = reader.header(raw.page_number, "page_number");
        let width = reader.header(raw.width, "width");
        let height = reader.header(raw.height, "height");
        let texts = reader.elements(raw.texts, ElementKind::Text);
        let images = reader.elements(raw.images, ElementKind::Image);
        let hlines = reader.elements(raw.hlines, ElementKind::HLine);
        let vlines = reader.elements(raw.vlines, ElementKind::VLine);
        let fills = reader.elements(raw.fills, ElementKind::Fill);
        let fields = reader.header(raw.fields, "fields");
        let boxsets = reader.header(raw.boxsets, "boxsets");
        let style_palette = reader.header(raw.style_palette, "stylePalette");
        Self {
            page_number,
            width,
            height,
            texts,
            images,
            hlines,
            vlines,
            fills,
            fields,
            boxsets,
            style_palette,
            rejected: reader.rejected,
            header_errors: reader.header_errors,
        }
    }
}

#[derive(Default)]
struct PageReader {
    rejected: Vec<RejectedElement>,
    header_errors: Vec<String>,
}

impl PageReader {
    /// Read a page-level field; absent and `null` give the default.
    fn header<T: DeserializeOwned + Default>(&mut self, value: Value, name: &str) -> T {
        if value.is_null() {
            return T::default();
        }
        serde_json::from_value(value).unwrap_or_else(|err| {
            self.header_errors.push(format!("{name}: {err}"));
            T::default()
        })
    }

    /// Read an element list entry by entry.
    fn elements<T: DeserializeOwned>(&mut self, value: Value, element: ElementKind) -> Vec<T> {
        let entries: Vec<Value> = self.header(value, list_name(element));
        let mut items = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            match serde_json::from_value(entry) {
                Ok(item) => items.push(item),
                Err(err) => self.rejected.push(RejectedElement {
                    element,
                    index,
                    reason: err.to_string(),
                }),
            }
        }
        items
    }
}

fn list_name(element: ElementKind) -> &'static str {
    match element {
        ElementKind::Text => "texts",
        ElementKind::Image => "images",
        ElementKind::HLine => "hlines",
        ElementKind::VLine => "vlines",
        ElementKind::Fill => "fills",
    }
}
