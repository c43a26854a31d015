//! lopdf-backed [`DocumentEngine`] implementation.
//!
//! Every page read interprets the page content once, with a [`Collector`]
//! for the one class of content asked for.

use std::sync::LazyLock;

use lopdf::{Dictionary, Object, ObjectId};
use pdfedit_core::{Ctm, ExtractOptions, RawDrawing, RawImage, RawSpan};

use crate::backend::{DocumentEngine, PageItems};
use crate::error::BackendError;
use crate::graphics_state::InterpreterState;
use crate::handler::{Collector, ContentClass, ContentHandler};
use crate::interpreter::{PageContext, interpret};
use crate::objects::{resolve, to_f64};
use crate::spans::merge_spans;
use crate::text_state::TextState;

/// A parsed document backed by lopdf.
pub struct LopdfDocument {
    inner: lopdf::Document,
    /// Page object ids in page order.
    page_ids: Vec<ObjectId>,
}

impl LopdfDocument {
    /// Access the underlying lopdf document.
    pub fn inner(&self) -> &lopdf::Document {
        &self.inner
    }

    fn page_id(&self, index: usize) -> Result<ObjectId, BackendError> {
        self.page_ids.get(index).copied().ok_or_else(|| {
            BackendError::Parse(format!(
                "page index {index} out of range (0..{})",
                self.page_ids.len()
            ))
        })
    }
}

impl std::fmt::Debug for LopdfDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LopdfDocument")
            .field("page_count", &self.page_ids.len())
            .finish_non_exhaustive()
    }
}

/// The lopdf document engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfEngine;

impl DocumentEngine for LopdfEngine {
    type Document = LopdfDocument;
    type Error = BackendError;

    fn open(bytes: &[u8]) -> Result<Self::Document, Self::Error> {
        let inner = lopdf::Document::load_mem(bytes)
            .map_err(|e| BackendError::Parse(format!("failed to parse PDF: {e}")))?;
        if inner.is_encrypted() {
            return Err(BackendError::Parse(
                "encrypted documents are not supported".to_string(),
            ));
        }
        let page_ids: Vec<ObjectId> = inner.get_pages().values().copied().collect();
        #[cfg(feature = "tracing")]
        tracing::debug!(pages = page_ids.len(), version = %inner.version, "opened document");
        Ok(LopdfDocument { inner, page_ids })
    }

    fn page_count(doc: &Self::Document) -> usize {
        doc.page_ids.len()
    }

    fn page_size(doc: &Self::Document, index: usize) -> Result<(f64, f64), Self::Error> {
        let [x0, y0, x1, y1] = media_box(doc, doc.page_id(index)?)?;
        Ok((x1 - x0, y1 - y0))
    }

    fn text_spans(
        doc: &Self::Document,
        index: usize,
        options: &ExtractOptions,
    ) -> Result<PageItems<RawSpan>, Self::Error> {
        let mut collector: Collector<RawSpan> =
            Collector::new(ContentClass::Text, options.max_elements_per_page);
        interpret_page(doc, index, options, &mut collector)?;
        let mut read = collector.into_items();
        if options.merge_spans {
            read.items = merge_spans(read.items);
        }
        Ok(read)
    }

    fn drawing_primitives(
        doc: &Self::Document,
        index: usize,
        options: &ExtractOptions,
    ) -> Result<PageItems<RawDrawing>, Self::Error> {
        let mut collector: Collector<RawDrawing> =
            Collector::new(ContentClass::Paths, options.max_elements_per_page);
        interpret_page(doc, index, options, &mut collector)?;
        Ok(collector.into_items())
    }

    fn raster_images(
        doc: &Self::Document,
        index: usize,
        options: &ExtractOptions,
    ) -> Result<PageItems<RawImage>, Self::Error> {
        if !options.extract_images {
            return Ok(PageItems::default());
        }
        let mut collector: Collector<RawImage> =
            Collector::new(ContentClass::Images, options.max_elements_per_page);
        interpret_page(doc, index, options, &mut collector)?;
        Ok(collector.into_items())
    }
}

fn interpret_page(
    doc: &LopdfDocument,
    index: usize,
    options: &ExtractOptions,
    handler: &mut dyn ContentHandler,
) -> Result<(), BackendError> {
    let page_id = doc.page_id(index)?;
    let [x0, y0, _, y1] = media_box(doc, page_id)?;
    let page_dict = doc
        .inner
        .get_object(page_id)
        .and_then(|o| o.as_dict())
        .map_err(|e| BackendError::Parse(format!("failed to get page dictionary: {e}")))?;
    let content = page_content_bytes(&doc.inner, page_dict)?;
    let resources = page_resources(&doc.inner, page_id)?;

    let ctx = PageContext {
        doc: &doc.inner,
        page_height: y1 - y0,
        options,
    };
    // Page space is normalized so the media box starts at the origin.
    let mut gstate = InterpreterState::new(Ctm::translation(-x0, -y0));
    let mut tstate = TextState::new();
    interpret(&ctx, &content, resources, handler, 0, &mut gstate, &mut tstate)
}

/// Look up a page attribute, walking up the page tree when the page does
/// not carry it.
fn resolve_inherited<'a>(
    doc: &'a lopdf::Document,
    page_id: ObjectId,
    key: &[u8],
) -> Result<Option<&'a Object>, BackendError> {
    let mut current_id = page_id;
    // A cyclic /Parent chain ends here.
    for _ in 0..64 {
        let dict = doc
            .get_object(current_id)
            .and_then(|o| o.as_dict())
            .map_err(|e| BackendError::Parse(format!("failed to get page dictionary: {e}")))?;

        if let Ok(value) = dict.get(key) {
            return Ok(Some(value));
        }

        match dict.get(b"Parent") {
            Ok(parent_obj) => {
                current_id = parent_obj
                    .as_reference()
                    .map_err(|e| BackendError::Parse(format!("invalid /Parent reference: {e}")))?;
            }
            Err(_) => return Ok(None),
        }
    }
    Err(BackendError::Parse("page tree is too deep".to_string()))
}

/// The normalized media box `[x0, y0, x1, y1]` with `x0 <= x1`, `y0 <= y1`.
fn media_box(doc: &LopdfDocument, page_id: ObjectId) -> Result<[f64; 4], BackendError> {
    let obj = resolve_inherited(&doc.inner, page_id, b"MediaBox")?
        .ok_or_else(|| BackendError::Parse("MediaBox not found on page or ancestors".into()))?;
    let array = resolve(&doc.inner, obj)
        .as_array()
        .map_err(|e| BackendError::Parse(format!("MediaBox is not an array: {e}")))?;
    let values: Vec<f64> = array
        .iter()
        .map(|o| to_f64(resolve(&doc.inner, o)))
        .collect::<Option<_>>()
        .ok_or_else(|| BackendError::Parse("MediaBox has a non-numeric entry".to_string()))?;
    let [a, b, c, d] = values[..] else {
        return Err(BackendError::Parse(format!(
            "MediaBox must have 4 elements, got {}",
            values.len()
        )));
    };
    let (x0, x1) = (a.min(c), a.max(c));
    let (y0, y1) = (b.min(d), b.max(d));
    if x1 - x0 <= 0.0 || y1 - y0 <= 0.0 {
        return Err(BackendError::Parse("MediaBox is empty".to_string()));
    }
    Ok([x0, y0, x1, y1])
}

/// Concatenated, decoded page content.
fn page_content_bytes(
    doc: &lopdf::Document,
    page_dict: &Dictionary,
) -> Result<Vec<u8>, BackendError> {
    let contents_obj = match page_dict.get(b"Contents") {
        Ok(obj) => obj,
        Err(_) => return Ok(Vec::new()),
    };

    match contents_obj {
        Object::Reference(id) => match doc.get_object(*id)? {
            Object::Array(arr) => join_content_streams(doc, arr),
            obj => {
                let stream = obj
                    .as_stream()
                    .map_err(|e| BackendError::Parse(format!("/Contents is not a stream: {e}")))?;
                decode_content_stream(stream)
            }
        },
        Object::Array(arr) => join_content_streams(doc, arr),
        _ => Err(BackendError::Parse(
            "/Contents is not a reference or array".to_string(),
        )),
    }
}

fn join_content_streams(doc: &lopdf::Document, arr: &[Object]) -> Result<Vec<u8>, BackendError> {
    let mut content = Vec::new();
    for item in arr {
        let id = item.as_reference().map_err(|e| {
            BackendError::Parse(format!("/Contents array item is not a reference: {e}"))
        })?;
        let stream = doc.get_object(id)?.as_stream().map_err(|e| {
            BackendError::Parse(format!("/Contents array item is not a stream: {e}"))
        })?;
        let bytes = decode_content_stream(stream)?;
        if !content.is_empty() {
            content.push(b' ');
        }
        content.extend_from_slice(&bytes);
    }
    Ok(content)
}

fn decode_content_stream(stream: &lopdf::Stream) -> Result<Vec<u8>, BackendError> {
    if stream.dict.get(b"Filter").is_ok() {
        stream
            .decompressed_content()
            .map_err(|e| BackendError::Parse(format!("failed to decompress content stream: {e}")))
    } else {
        Ok(stream.content.clone())
    }
}

fn page_resources(doc: &lopdf::Document, page_id: ObjectId) -> Result<&Dictionary, BackendError> {
    static EMPTY: LazyLock<Dictionary> = LazyLock::new(Dictionary::new);
    match resolve_inherited(doc, page_id, b"Resources")? {
        Some(obj) => {
            let obj = match obj {
                Object::Reference(id) => doc.get_object(*id).map_err(|e| {
                    BackendError::Parse(format!("failed to resolve /Resources reference: {e}"))
                })?,
                other => other,
            };
            obj.as_dict()
                .map_err(|_| BackendError::Parse("/Resources is not a dictionary".to_string()))
        }
        None => Ok(&EMPTY),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{Document, Stream, dictionary};
    use pdfedit_core::{DrawingShape, Rgb};

    /// One page per entry, each with its own content stream and a
    /// Helvetica font resource named F1.
    fn pdf_with_pages(contents: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id: ObjectId = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let mut kids: Vec<Object> = Vec::new();
        for content in contents {
            let content_id =
                doc.add_object(Stream::new(Dictionary::new(), content.as_bytes().to_vec()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }
        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Resources" => dictionary! {
                    "Font" => dictionary! { "F1" => font_id },
                },
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).expect("failed to save test PDF");
        buf
    }

    #[test]
    fn open_counts_pages() {
        let doc = LopdfEngine::open(&pdf_with_pages(&["", "", ""])).unwrap();
        assert_eq!(LopdfEngine::page_count(&doc), 3);
    }

    #[test]
    fn open_rejects_garbage() {
        let err = LopdfEngine::open(b"not a pdf").unwrap_err();
        assert!(matches!(err, BackendError::Parse(_)));
    }

    #[test]
    fn inherited_media_box() {
        let doc = LopdfEngine::open(&pdf_with_pages(&[""])).unwrap();
        assert_eq!(LopdfEngine::page_size(&doc, 0).unwrap(), (612.0, 792.0));
    }

    #[test]
    fn page_index_out_of_range() {
        let doc = LopdfEngine::open(&pdf_with_pages(&[""])).unwrap();
        assert!(LopdfEngine::page_size(&doc, 1).is_err());
        assert!(LopdfEngine::text_spans(&doc, 1, &ExtractOptions::default()).is_err());
    }

    #[test]
    fn text_spans_are_merged_by_default() {
        let bytes = pdf_with_pages(&["BT /F1 12 Tf 72 700 Td (Hel) Tj (lo) Tj ET"]);
        let doc = LopdfEngine::open(&bytes).unwrap();
        let merged = LopdfEngine::text_spans(&doc, 0, &ExtractOptions::default()).unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].text, "Hello");
        assert_eq!(merged[0].font, "Helvetica");

        let options = ExtractOptions {
            merge_spans: false,
            ..ExtractOptions::default()
        };
        let pieces = LopdfEngine::text_spans(&doc, 0, &options).unwrap();
        assert_eq!(pieces.len(), 2);
    }

    #[test]
    fn drawings_use_top_left_origin() {
        let bytes = pdf_with_pages(&["0 0 1 RG 2 w 72 700 m 300 700 l S"]);
        let doc = LopdfEngine::open(&bytes).unwrap();
        let drawings = LopdfEngine::drawing_primitives(&doc, 0, &ExtractOptions::default()).unwrap();
        assert_eq!(drawings.len(), 1);
        assert_eq!(drawings[0].stroke, Some(Rgb(0x0000FF)));
        match drawings[0].shape {
            DrawingShape::Segment { from, to } => {
                assert!((from.y - 92.0).abs() < 1e-9);
                assert!((to.x - 300.0).abs() < 1e-9);
            }
            DrawingShape::Rect(_) => panic!("expected a segment"),
        }
    }

    #[test]
    fn element_limit_caps_each_read() {
        let bytes = pdf_with_pages(&["BT /F1 12 Tf 0 700 Td (a) Tj 0 -20 Td (b) Tj 0 -20 Td (c) Tj ET"]);
        let doc = LopdfEngine::open(&bytes).unwrap();
        let options = ExtractOptions {
            max_elements_per_page: 2,
            ..ExtractOptions::default()
        };
        let read = LopdfEngine::text_spans(&doc, 0, &options).unwrap();
        assert_eq!(read.len(), 2);
        assert_eq!(read.dropped, 1);

        let read = LopdfEngine::text_spans(&doc, 0, &ExtractOptions::default()).unwrap();
        assert!(!read.is_truncated());
    }

    #[test]
    fn bad_path_does_not_break_text_read() {
        let bytes = pdf_with_pages(&["BT /F1 12 Tf 72 700 Td (ok) Tj ET 10 m S"]);
        let doc = LopdfEngine::open(&bytes).unwrap();
        let spans = LopdfEngine::text_spans(&doc, 0, &ExtractOptions::default()).unwrap();
        assert_eq!(spans[0].text, "ok");
        assert!(LopdfEngine::drawing_primitives(&doc, 0, &ExtractOptions::default()).is_err());
    }

    #[test]
    fn images_skipped_when_disabled() {
        let bytes = pdf_with_pages(&["q 10 0 0 10 0 0 cm /Im1 Do Q"]);
        let doc = LopdfEngine::open(&bytes).unwrap();
        let options = ExtractOptions {
            extract_images: false,
            ..ExtractOptions::default()
        };
        assert!(LopdfEngine::raster_images(&doc, 0, &options).unwrap().is_empty());
        // The image resource is missing, which only the image read notices.
        assert!(LopdfEngine::raster_images(&doc, 0, &ExtractOptions::default()).is_err());
    }

    #[test]
    fn page_without_contents_is_empty() {
        let mut doc = Document::with_version("1.5");
        let pages_id: ObjectId = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![10.into(), 20.into(), 110.into(), 220.into()],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::from(page_id)],
                "Count" => 1i64,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();

        let doc = LopdfEngine::open(&buf).unwrap();
        assert_eq!(LopdfEngine::page_size(&doc, 0).unwrap(), (100.0, 200.0));
        let options = ExtractOptions::default();
        assert!(LopdfEngine::text_spans(&doc, 0, &options).unwrap().is_empty());
        assert!(LopdfEngine::drawing_primitives(&doc, 0, &options).unwrap().is_empty());
        assert!(LopdfEngine::raster_images(&doc, 0, &options).unwrap().is_empty());
    }
}
